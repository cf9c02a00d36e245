//! Full-text search over message content
//!
//! User queries are never passed to FTS5 MATCH verbatim. The escaping layer
//! turns free-form input into a MATCH expression that treats punctuation as
//! literal text while keeping two power-user forms intact: trailing `*`
//! prefix searches and double-quoted phrases.

use crate::connection::{Store, StoreError};

/// Result ordering for search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchSort {
    /// Best match first (bm25)
    #[default]
    Relevance,
    /// Chronological, oldest first
    Oldest,
    /// Chronological, newest first
    Newest,
}

/// A search request
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    /// Project path prefix filter
    pub project: Option<String>,
    pub limit: Option<i64>,
    pub sort: SearchSort,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: SearchSort) -> Self {
        self.sort = sort;
        self
    }
}

/// One search result
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub uuid: String,
    pub session_id: String,
    pub project_path: String,
    pub message_type: String,
    pub timestamp: i64,
    /// Extract with every matched span wrapped in `>>>`/`<<<`
    pub snippet: String,
    /// bm25 score, lower is more relevant
    pub score: f64,
}

/// Default number of results when the query does not set a limit
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Weight of a `content_text` match relative to a `thinking` match.
/// With equal term overlap, a hit in what was actually said outranks a
/// hit in deliberation.
const CONTENT_WEIGHT: f64 = 10.0;
const THINKING_WEIGHT: f64 = 1.0;

impl Store {
    /// Search indexed messages.
    ///
    /// The raw query goes through [`escape_match_query`] first, so callers
    /// can pass arbitrary user input. A query that escapes to nothing
    /// returns no hits rather than an error.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, StoreError> {
        let match_expr = escape_match_query(&query.query);
        if match_expr.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT
                m.uuid,
                m.session_id,
                s.project_path,
                m.type,
                m.timestamp,
                snippet(messages_fts, -1, '>>>', '<<<', '...', 24) AS extract,
                bm25(messages_fts, {CONTENT_WEIGHT}, {THINKING_WEIGHT}) AS score
             FROM messages_fts fts
             JOIN messages m ON fts.rowid = m.rowid
             JOIN sessions s ON s.id = m.session_id
             WHERE messages_fts MATCH ?"
        );

        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        params.push(Box::new(match_expr));

        if let Some(project) = &query.project {
            sql.push_str(" AND s.project_path LIKE ?");
            params.push(Box::new(format!("{}%", project)));
        }

        sql.push_str(match query.sort {
            SearchSort::Relevance => " ORDER BY score ASC",
            SearchSort::Oldest => " ORDER BY m.timestamp ASC",
            SearchSort::Newest => " ORDER BY m.timestamp DESC",
        });

        sql.push_str(" LIMIT ?");
        params.push(Box::new(query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT)));

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(SearchHit {
                uuid: row.get(0)?,
                session_id: row.get(1)?,
                project_path: row.get(2)?,
                message_type: row.get(3)?,
                timestamp: row.get(4)?,
                snippet: row.get(5)?,
                score: row.get(6)?,
            })
        })?;

        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }
        Ok(hits)
    }

    /// Regenerate the full-text index from the messages table.
    ///
    /// Safe whenever no sync run is open on this connection; rebuilding
    /// loses nothing and duplicates nothing.
    pub fn rebuild_fts(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch("INSERT INTO messages_fts(messages_fts) VALUES('rebuild')")?;
        Ok(())
    }
}

/// Escape free-form user input into FTS5 MATCH syntax.
///
/// Tokens are split on whitespace. A token containing anything outside the
/// FTS5 bareword alphabet is double-quoted so `.` `/` `-` `:` `(` `)` `^`
/// `+` `'` lose their operator meaning. Preserved as written: a trailing
/// `*` (prefix search) and double-quoted phrases (adjacency search, an
/// unbalanced quote is closed). Tokens are joined with spaces, which FTS5
/// treats as AND.
pub fn escape_match_query(raw: &str) -> String {
    let mut terms: Vec<String> = Vec::new();
    let mut rest = raw.trim();

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('"') {
            // Quoted phrase: runs to the closing quote, or to the end of
            // input when the user never closed it
            let (phrase, tail) = match stripped.find('"') {
                Some(end) => (&stripped[..end], &stripped[end + 1..]),
                None => (stripped, ""),
            };
            if !phrase.trim().is_empty() {
                terms.push(format!("\"{}\"", phrase));
            }
            rest = tail.trim_start();
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let (token, tail) = rest.split_at(end);
            if let Some(term) = escape_token(token) {
                terms.push(term);
            }
            rest = tail.trim_start();
        }
    }

    terms.join(" ")
}

fn escape_token(token: &str) -> Option<String> {
    let (body, prefix) = match token.strip_suffix('*') {
        Some(body) => (body, true),
        None => (token, false),
    };
    if body.is_empty() {
        return None;
    }

    let bareword = body.chars().all(is_bareword_char) && !is_fts_keyword(body);
    let escaped = if bareword {
        body.to_string()
    } else {
        format!("\"{}\"", body.replace('"', "\"\""))
    };

    Some(if prefix { escaped + "*" } else { escaped })
}

/// Characters FTS5 accepts in an unquoted token
fn is_bareword_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || (c as u32) >= 0x80
}

/// Uppercase operator keywords would change query semantics if left bare
fn is_fts_keyword(token: &str) -> bool {
    matches!(token, "AND" | "OR" | "NOT" | "NEAR")
}
