//! Aggregate and lookup queries over the index

use crate::connection::{Store, StoreError};

/// Index-wide counts and token totals
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub sessions: i64,
    pub messages: i64,
    pub tool_calls: i64,
    pub tool_results: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,
}

impl StoreStats {
    /// Sum of all four token counters
    pub fn total_tokens(&self) -> i64 {
        self.input_tokens + self.output_tokens + self.cache_read_tokens + self.cache_creation_tokens
    }
}

/// Options for listing sessions
#[derive(Debug, Clone, Default)]
pub struct ListSessionsOptions {
    /// Project path prefix filter
    pub project: Option<String>,
    pub limit: Option<i64>,
}

impl ListSessionsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A session annotated with derived per-session aggregates
#[derive(Debug, Clone)]
pub struct SessionOverview {
    pub id: String,
    pub project_path: String,
    pub git_branch: Option<String>,
    pub summary: Option<String>,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
    pub message_count: i64,
    pub total_tokens: i64,
}

/// A stored message
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub uuid: String,
    pub session_id: String,
    pub parent_uuid: Option<String>,
    pub message_type: String,
    pub model: Option<String>,
    pub content_text: Option<String>,
    pub thinking: Option<String>,
    pub timestamp: i64,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
}

/// Messages surrounding an anchor timestamp, both sides chronological
#[derive(Debug, Clone, Default)]
pub struct ContextWindow {
    pub before: Vec<MessageRow>,
    pub after: Vec<MessageRow>,
}

/// Per-tool usage within the selected scope
#[derive(Debug, Clone)]
pub struct ToolStat {
    pub tool_name: String,
    pub count: i64,
    /// Share of the in-scope total, 0..=100
    pub percent: f64,
}

const MESSAGE_COLUMNS: &str = "uuid, session_id, parent_uuid, type, model, content_text,
             thinking, timestamp, input_tokens, output_tokens";

impl Store {
    /// Get index statistics: entity counts and token totals
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let sessions: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        let messages: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        let tool_calls: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM tool_calls", [], |row| row.get(0))?;
        let tool_results: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM tool_results", [], |row| row.get(0))?;

        let (input_tokens, output_tokens, cache_read_tokens, cache_creation_tokens) =
            self.conn.query_row(
                "SELECT COALESCE(SUM(input_tokens), 0),
                        COALESCE(SUM(output_tokens), 0),
                        COALESCE(SUM(cache_read_tokens), 0),
                        COALESCE(SUM(cache_creation_tokens), 0)
                 FROM messages",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        Ok(StoreStats {
            sessions,
            messages,
            tool_calls,
            tool_results,
            input_tokens,
            output_tokens,
            cache_read_tokens,
            cache_creation_tokens,
        })
    }

    /// List sessions, most recently active first
    pub fn sessions(&self, options: &ListSessionsOptions) -> Result<Vec<SessionOverview>, StoreError> {
        let mut sql = String::from(
            r#"
            SELECT
                s.id,
                s.project_path,
                s.git_branch,
                s.summary,
                s.first_timestamp,
                s.last_timestamp,
                COUNT(m.uuid) AS message_count,
                COALESCE(SUM(
                    COALESCE(m.input_tokens, 0) + COALESCE(m.output_tokens, 0) +
                    COALESCE(m.cache_read_tokens, 0) + COALESCE(m.cache_creation_tokens, 0)
                ), 0) AS total_tokens
            FROM sessions s
            LEFT JOIN messages m ON m.session_id = s.id
            WHERE 1=1
            "#,
        );

        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(project) = &options.project {
            sql.push_str(" AND s.project_path LIKE ?");
            params.push(Box::new(format!("{}%", project)));
        }

        sql.push_str(" GROUP BY s.id ORDER BY s.last_timestamp DESC");

        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_session_overview)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    /// Get up to `count` messages strictly before and strictly after an
    /// anchor timestamp within one session. Both sides come back in
    /// chronological order. An unknown session yields empty lists.
    pub fn messages_around(
        &self,
        session_id: &str,
        anchor_ms: i64,
        count: i64,
    ) -> Result<ContextWindow, StoreError> {
        let before_sql = format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages
             WHERE session_id = ?1 AND timestamp < ?2
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?3"
        );
        let mut stmt = self.conn.prepare(&before_sql)?;
        let rows = stmt.query_map(
            rusqlite::params![session_id, anchor_ms, count],
            row_to_message,
        )?;
        let mut before = Vec::new();
        for row in rows {
            before.push(row?);
        }
        // Fetched newest-first to get the nearest ones, flip to chronological
        before.reverse();

        let after_sql = format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages
             WHERE session_id = ?1 AND timestamp > ?2
             ORDER BY timestamp ASC, rowid ASC
             LIMIT ?3"
        );
        let mut stmt = self.conn.prepare(&after_sql)?;
        let rows = stmt.query_map(
            rusqlite::params![session_id, anchor_ms, count],
            row_to_message,
        )?;
        let mut after = Vec::new();
        for row in rows {
            after.push(row?);
        }

        Ok(ContextWindow { before, after })
    }

    /// Per-tool invocation counts, most used first.
    /// Percentages are relative to the in-scope total and sum to 100.
    pub fn tool_stats(&self, project: Option<&str>) -> Result<Vec<ToolStat>, StoreError> {
        let mut sql = String::from(
            "SELECT t.tool_name, COUNT(*) AS uses
             FROM tool_calls t",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(project) = project {
            sql.push_str(
                " JOIN sessions s ON s.id = t.session_id
                  WHERE s.project_path LIKE ?",
            );
            params.push(Box::new(format!("{}%", project)));
        }

        sql.push_str(" GROUP BY t.tool_name ORDER BY uses DESC, t.tool_name ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = Vec::new();
        let mut total: i64 = 0;
        for row in rows {
            let (tool_name, count) = row?;
            total += count;
            counts.push((tool_name, count));
        }

        Ok(counts
            .into_iter()
            .map(|(tool_name, count)| ToolStat {
                tool_name,
                count,
                percent: count as f64 * 100.0 / total as f64,
            })
            .collect())
    }
}

fn row_to_session_overview(row: &rusqlite::Row) -> Result<SessionOverview, rusqlite::Error> {
    Ok(SessionOverview {
        id: row.get(0)?,
        project_path: row.get(1)?,
        git_branch: row.get(2)?,
        summary: row.get(3)?,
        first_timestamp: row.get(4)?,
        last_timestamp: row.get(5)?,
        message_count: row.get(6)?,
        total_tokens: row.get(7)?,
    })
}

fn row_to_message(row: &rusqlite::Row) -> Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        uuid: row.get(0)?,
        session_id: row.get(1)?,
        parent_uuid: row.get(2)?,
        message_type: row.get(3)?,
        model: row.get(4)?,
        content_text: row.get(5)?,
        thinking: row.get(6)?,
        timestamp: row.get(7)?,
        input_tokens: row.get(8)?,
        output_tokens: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::SessionUpsert;
    use recall_core::{MessageRecord, TokenUsage, ToolCallRecord};

    fn session(id: &str, project: &str, ts: i64) -> SessionUpsert {
        SessionUpsert {
            id: id.to_string(),
            project_path: project.to_string(),
            git_branch: None,
            cwd: None,
            timestamp_ms: ts,
            summary: None,
        }
    }

    fn message(uuid: &str, session_id: &str, ts: i64) -> MessageRecord {
        MessageRecord {
            uuid: uuid.to_string(),
            session_id: session_id.to_string(),
            parent_uuid: None,
            record_type: "user".to_string(),
            model: None,
            content_text: Some(format!("content {}", uuid)),
            content_json: None,
            thinking: None,
            timestamp_ms: ts,
            cwd: None,
            git_branch: None,
            usage: None,
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    }

    fn insert_tool(store: &Store, msg: &MessageRecord, id: &str, name: &str) {
        store
            .insert_tool_call(
                msg,
                &ToolCallRecord {
                    id: id.to_string(),
                    name: name.to_string(),
                    input_json: None,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_stats_counts_and_token_sums() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_session(&session("s1", "/p/one", 1000)).unwrap();

        let mut m1 = message("u1", "s1", 1000);
        m1.usage = Some(TokenUsage {
            input_tokens: 10,
            output_tokens: 20,
            cache_creation_input_tokens: Some(5),
            cache_read_input_tokens: Some(100),
        });
        store.insert_message(&m1).unwrap();

        let mut m2 = message("u2", "s1", 2000);
        m2.usage = Some(TokenUsage {
            input_tokens: 1,
            output_tokens: 2,
            cache_creation_input_tokens: None,
            cache_read_input_tokens: None,
        });
        store.insert_message(&m2).unwrap();

        // No usage at all contributes nothing
        store.insert_message(&message("u3", "s1", 3000)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.messages, 3);
        assert_eq!(stats.input_tokens, 11);
        assert_eq!(stats.output_tokens, 22);
        assert_eq!(stats.cache_read_tokens, 100);
        assert_eq!(stats.cache_creation_tokens, 5);
        assert_eq!(stats.total_tokens(), 138);
    }

    #[test]
    fn test_sessions_ordering_and_aggregates() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_session(&session("old", "/p/one", 1000)).unwrap();
        store.upsert_session(&session("new", "/p/two", 9000)).unwrap();

        let mut m = message("u1", "old", 1000);
        m.usage = Some(TokenUsage {
            input_tokens: 3,
            output_tokens: 4,
            cache_creation_input_tokens: None,
            cache_read_input_tokens: None,
        });
        store.insert_message(&m).unwrap();
        store.insert_message(&message("u2", "old", 1500)).unwrap();

        let sessions = store.sessions(&ListSessionsOptions::new()).unwrap();
        assert_eq!(sessions.len(), 2);
        // Most recently active first
        assert_eq!(sessions[0].id, "new");
        assert_eq!(sessions[0].message_count, 0);
        assert_eq!(sessions[1].id, "old");
        assert_eq!(sessions[1].message_count, 2);
        assert_eq!(sessions[1].total_tokens, 7);
    }

    #[test]
    fn test_sessions_project_prefix_filter_and_limit() {
        let store = Store::open_in_memory().unwrap();
        store
            .upsert_session(&session("a", "/home/jane/app", 1000))
            .unwrap();
        store
            .upsert_session(&session("b", "/home/jane/app/sub", 2000))
            .unwrap();
        store
            .upsert_session(&session("c", "/home/jane/other", 3000))
            .unwrap();

        let options = ListSessionsOptions::new().with_project("/home/jane/app");
        let sessions = store.sessions(&options).unwrap();
        let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let options = ListSessionsOptions::new().with_limit(1);
        let sessions = store.sessions(&options).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "c");
    }

    #[test]
    fn test_messages_around_window() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_session(&session("s1", "/p", 1000)).unwrap();
        store.upsert_session(&session("s2", "/p", 1000)).unwrap();

        for (uuid, ts) in [("u1", 1000), ("u2", 2000), ("u3", 3000), ("u4", 4000), ("u5", 5000)] {
            store.insert_message(&message(uuid, "s1", ts)).unwrap();
        }
        // Same timestamps in another session must not leak in
        store.insert_message(&message("x1", "s2", 2500)).unwrap();

        let window = store.messages_around("s1", 3000, 2).unwrap();
        let before: Vec<_> = window.before.iter().map(|m| m.uuid.as_str()).collect();
        let after: Vec<_> = window.after.iter().map(|m| m.uuid.as_str()).collect();
        assert_eq!(before, vec!["u1", "u2"]);
        assert_eq!(after, vec!["u4", "u5"]);

        // Window narrower than requested near the edges
        let window = store.messages_around("s1", 1000, 3).unwrap();
        assert!(window.before.is_empty());
        assert_eq!(window.after.len(), 3);

        // The anchor itself is excluded on both sides
        let window = store.messages_around("s1", 3000, 10).unwrap();
        assert!(!window.before.iter().any(|m| m.uuid == "u3"));
        assert!(!window.after.iter().any(|m| m.uuid == "u3"));
    }

    #[test]
    fn test_messages_around_unknown_session() {
        let store = Store::open_in_memory().unwrap();
        let window = store.messages_around("missing", 1000, 5).unwrap();
        assert!(window.before.is_empty());
        assert!(window.after.is_empty());
    }

    #[test]
    fn test_tool_stats_percentages() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_session(&session("s1", "/p/one", 1000)).unwrap();
        store.upsert_session(&session("s2", "/p/two", 1000)).unwrap();

        let m1 = message("u1", "s1", 1000);
        store.insert_message(&m1).unwrap();
        let m2 = message("u2", "s2", 2000);
        store.insert_message(&m2).unwrap();

        insert_tool(&store, &m1, "t1", "Bash");
        insert_tool(&store, &m1, "t2", "Bash");
        insert_tool(&store, &m1, "t3", "Read");
        insert_tool(&store, &m2, "t4", "Edit");

        let stats = store.tool_stats(None).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].tool_name, "Bash");
        assert_eq!(stats[0].count, 2);
        assert!((stats[0].percent - 50.0).abs() < 1e-9);

        let total: f64 = stats.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);

        // Project scope excludes the other project's tools
        let scoped = store.tool_stats(Some("/p/one")).unwrap();
        let names: Vec<_> = scoped.iter().map(|s| s.tool_name.as_str()).collect();
        assert_eq!(names, vec!["Bash", "Read"]);
        let total: f64 = scoped.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_tool_stats_empty() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.tool_stats(None).unwrap().is_empty());
    }
}
