//! Idempotent ingestion writes
//!
//! Every operation here is safe to replay: sessions merge, messages and
//! tool entities insert-or-ignore, cursors replace. The sync engine calls
//! these inside the run transaction owned by
//! [`Store::begin_run`](crate::Store::begin_run).

use crate::connection::{Store, StoreError};
use recall_core::{MessageRecord, ToolCallRecord, ToolResultRecord};

/// Session fields observed on a single record
#[derive(Debug, Clone)]
pub struct SessionUpsert {
    pub id: String,
    pub project_path: String,
    pub git_branch: Option<String>,
    pub cwd: Option<String>,
    /// Timestamp of the observed record, extends the session's span
    pub timestamp_ms: i64,
    pub summary: Option<String>,
}

/// Per-file sync cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCursor {
    /// Source file mtime in epoch milliseconds, as of the last pass
    pub last_modified_ms: i64,
    /// First byte not yet consumed
    pub byte_offset: u64,
}

impl Store {
    /// Create a session on first sight, merge on every later sight.
    ///
    /// Merge semantics: the timestamp span only widens, `project_path` is
    /// fixed at creation, and nullable fields are replaced only by non-null
    /// incoming values so a later record without a summary never blanks an
    /// earlier one.
    pub fn upsert_session(&self, session: &SessionUpsert) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO sessions
             (id, project_path, git_branch, cwd, first_timestamp, last_timestamp, summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 first_timestamp = MIN(first_timestamp, excluded.first_timestamp),
                 last_timestamp = MAX(last_timestamp, excluded.last_timestamp),
                 git_branch = COALESCE(excluded.git_branch, git_branch),
                 cwd = COALESCE(excluded.cwd, cwd),
                 summary = COALESCE(excluded.summary, summary)",
            rusqlite::params![
                session.id,
                session.project_path,
                session.git_branch,
                session.cwd,
                session.timestamp_ms,
                session.summary,
            ],
        )?;
        Ok(())
    }

    /// Set a session's summary. Returns false for an unknown session.
    pub fn set_session_summary(&self, session_id: &str, summary: &str) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE sessions SET summary = ?2 WHERE id = ?1",
            rusqlite::params![session_id, summary],
        )?;
        Ok(changed > 0)
    }

    /// Insert a message. Re-inserting an existing uuid is a no-op;
    /// the return value reports whether a row was actually added.
    pub fn insert_message(&self, msg: &MessageRecord) -> Result<bool, StoreError> {
        let usage = msg.usage.as_ref();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO messages
             (uuid, session_id, parent_uuid, type, model, content_text, content_json,
              thinking, timestamp, input_tokens, output_tokens, cache_read_tokens,
              cache_creation_tokens)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                msg.uuid,
                msg.session_id,
                msg.parent_uuid,
                msg.record_type,
                msg.model,
                msg.content_text,
                msg.content_json,
                msg.thinking,
                msg.timestamp_ms,
                usage.map(|u| u.input_tokens as i64),
                usage.map(|u| u.output_tokens as i64),
                usage.and_then(|u| u.cache_read_input_tokens.map(|t| t as i64)),
                usage.and_then(|u| u.cache_creation_input_tokens.map(|t| t as i64)),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Insert a tool invocation extracted from `msg`. Duplicate ids are a no-op.
    pub fn insert_tool_call(
        &self,
        msg: &MessageRecord,
        call: &ToolCallRecord,
    ) -> Result<bool, StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO tool_calls
             (id, message_uuid, session_id, tool_name, input_json, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                call.id,
                msg.uuid,
                msg.session_id,
                call.name,
                call.input_json,
                msg.timestamp_ms,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Insert a tool result extracted from `msg`. Duplicate ids are a no-op.
    pub fn insert_tool_result(
        &self,
        msg: &MessageRecord,
        result: &ToolResultRecord,
    ) -> Result<bool, StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO tool_results
             (tool_use_id, message_uuid, session_id, content, is_error, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                result.tool_use_id,
                msg.uuid,
                msg.session_id,
                result.content,
                result.is_error,
                msg.timestamp_ms,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Get the sync cursor for a file, if one was ever written
    pub fn sync_cursor(&self, file_path: &str) -> Result<Option<SyncCursor>, StoreError> {
        let result = self.conn.query_row(
            "SELECT last_modified, last_byte_offset FROM sync_state WHERE file_path = ?1",
            [file_path],
            |row| {
                Ok(SyncCursor {
                    last_modified_ms: row.get(0)?,
                    byte_offset: row.get::<_, i64>(1)? as u64,
                })
            },
        );

        match result {
            Ok(cursor) => Ok(Some(cursor)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a file's sync cursor, replacing any previous one
    pub fn set_sync_cursor(&self, file_path: &str, cursor: &SyncCursor) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sync_state (file_path, last_modified, last_byte_offset)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![file_path, cursor.last_modified_ms, cursor.byte_offset as i64],
        )?;
        Ok(())
    }

    /// Drop all sync cursors, forcing the next run to re-scan every file.
    /// Indexed rows stay in place; the re-scan is absorbed by the
    /// insert-or-ignore contract. Returns the number of cursors dropped.
    pub fn clear_sync_cursors(&self) -> Result<usize, StoreError> {
        let cleared = self.conn.execute("DELETE FROM sync_state", [])?;
        Ok(cleared)
    }

    /// Total indexed messages
    pub fn count_messages(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Total indexed tool entities (calls plus results)
    pub fn count_tool_entities(&self) -> Result<i64, StoreError> {
        let count = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM tool_calls) + (SELECT COUNT(*) FROM tool_results)",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
