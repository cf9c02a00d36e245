//! recall-store - SQLite storage layer for the recall index
//!
//! This crate owns the index database: schema, idempotent ingestion writes,
//! full-text search over message content, and the aggregate queries the CLI
//! surfaces. The companion `recall-sync` crate drives ingestion; everything
//! that touches SQLite lives here.

pub mod connection;
pub mod ingest;
pub mod introspect;
pub mod queries;
pub mod schema;
pub mod search;

pub use connection::{Store, StoreError};
pub use ingest::{SessionUpsert, SyncCursor};
pub use introspect::{ColumnInfo, ForeignKeyInfo, TableSchema};
pub use queries::{
    ContextWindow, ListSessionsOptions, MessageRow, SessionOverview, StoreStats, ToolStat,
};
pub use schema::{init_schema, DB_VERSION};
pub use search::{escape_match_query, SearchHit, SearchQuery, SearchSort};
