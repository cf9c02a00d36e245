//! Database schema creation

use rusqlite::Connection;

use crate::connection::StoreError;

/// Current database schema version
pub const DB_VERSION: i32 = 1;

/// Initialize the database schema (idempotent)
pub fn init_schema(conn: &mut Connection) -> Result<(), StoreError> {
    // Metadata table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT
        )",
    )?;

    // Sessions table. Timestamps are epoch milliseconds.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            project_path TEXT NOT NULL,
            git_branch TEXT,
            cwd TEXT,
            first_timestamp INTEGER NOT NULL,
            last_timestamp INTEGER NOT NULL,
            summary TEXT
        )",
    )?;

    // Messages table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
            uuid TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id),
            parent_uuid TEXT,
            type TEXT NOT NULL,
            model TEXT,
            content_text TEXT,
            content_json TEXT,
            thinking TEXT,
            timestamp INTEGER NOT NULL,
            input_tokens INTEGER,
            output_tokens INTEGER,
            cache_read_tokens INTEGER,
            cache_creation_tokens INTEGER
        )",
    )?;

    // Tool invocations and results, keyed by the tool use id
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tool_calls (
            id TEXT PRIMARY KEY,
            message_uuid TEXT NOT NULL REFERENCES messages(uuid),
            session_id TEXT NOT NULL,
            tool_name TEXT NOT NULL,
            input_json TEXT,
            timestamp INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tool_results (
            tool_use_id TEXT PRIMARY KEY,
            message_uuid TEXT NOT NULL REFERENCES messages(uuid),
            session_id TEXT NOT NULL,
            content TEXT,
            is_error INTEGER NOT NULL DEFAULT 0,
            timestamp INTEGER NOT NULL
        )",
    )?;

    // Per-file sync cursors
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sync_state (
            file_path TEXT PRIMARY KEY,
            last_modified INTEGER NOT NULL,
            last_byte_offset INTEGER NOT NULL DEFAULT 0
        )",
    )?;

    // Indexes for common queries
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id);
         CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
         CREATE INDEX IF NOT EXISTS idx_sessions_project ON sessions(project_path);
         CREATE INDEX IF NOT EXISTS idx_tool_calls_session ON tool_calls(session_id);
         CREATE INDEX IF NOT EXISTS idx_tool_calls_message ON tool_calls(message_uuid);
         CREATE INDEX IF NOT EXISTS idx_tool_results_message ON tool_results(message_uuid);",
    )?;

    // FTS5 shadow index over message content, external content table
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS messages_fts USING fts5(
            content_text,
            thinking,
            content='messages',
            content_rowid='rowid'
        )",
    )?;

    // Triggers keep messages_fts in lock step with messages. An INSERT OR
    // IGNORE that ignores a duplicate fires no trigger, so duplicates never
    // reach the index.
    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS messages_ai AFTER INSERT ON messages BEGIN
            INSERT INTO messages_fts(rowid, content_text, thinking)
            VALUES (new.rowid, new.content_text, new.thinking);
        END;

        CREATE TRIGGER IF NOT EXISTS messages_ad AFTER DELETE ON messages BEGIN
            INSERT INTO messages_fts(messages_fts, rowid, content_text, thinking)
            VALUES ('delete', old.rowid, old.content_text, old.thinking);
        END;

        CREATE TRIGGER IF NOT EXISTS messages_au AFTER UPDATE ON messages BEGIN
            INSERT INTO messages_fts(messages_fts, rowid, content_text, thinking)
            VALUES ('delete', old.rowid, old.content_text, old.thinking);
            INSERT INTO messages_fts(rowid, content_text, thinking)
            VALUES (new.rowid, new.content_text, new.thinking);
        END;",
    )?;

    // Set version
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?1)",
        [&DB_VERSION.to_string()],
    )?;

    Ok(())
}
