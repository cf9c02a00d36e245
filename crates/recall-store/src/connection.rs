//! Read-write connection to the index database

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema;

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connection to the index database.
///
/// A `Store` is single-threaded and single-writer. Readers in other
/// processes may run concurrently and observe committed data only (the
/// database is in WAL mode).
pub struct Store {
    pub(crate) conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open or create the index database at a specific path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let mut store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory store (used by tests)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn, path: None };
        store.init()?;
        Ok(store)
    }

    fn init(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        schema::init_schema(&mut self.conn)?;
        Ok(())
    }

    /// Get the database path (None for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a sync run.
    ///
    /// The whole run is one transaction: either every file's new records
    /// and cursor updates become durable together at [`Store::commit_run`],
    /// or none do. Foreign keys are switched off for the duration (the
    /// pragma has no effect once a transaction is open, so it comes first)
    /// and restored when the run ends.
    pub fn begin_run(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = OFF;
             BEGIN IMMEDIATE;",
        )?;
        Ok(())
    }

    /// Commit a sync run started with [`Store::begin_run`]
    pub fn commit_run(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "COMMIT;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }

    /// Roll back a sync run, discarding everything since [`Store::begin_run`]
    pub fn abort_run(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "ROLLBACK;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }
}
