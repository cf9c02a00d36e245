//! Schema introspection
//!
//! Lets the CLI answer "what is actually in this index" without shipping a
//! copy of the DDL: tables, columns, foreign keys, indexes, and row counts
//! straight from SQLite's own catalog.

use crate::connection::{Store, StoreError};

/// One column of a table
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, empty for FTS virtual table columns
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// One outgoing foreign key
#[derive(Debug, Clone)]
pub struct ForeignKeyInfo {
    pub from_column: String,
    pub references_table: String,
    /// None when the reference targets the parent's primary key implicitly
    pub references_column: Option<String>,
}

/// Everything known about one table
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub indexes: Vec<String>,
    pub row_count: i64,
}

impl Store {
    /// Describe tables in the index.
    ///
    /// With a table name, describes just that table; an unknown name yields
    /// an empty vector, not an error. Without one, describes every table
    /// except SQLite internals and the FTS shadow tables.
    pub fn schema(&self, table: Option<&str>) -> Result<Vec<TableSchema>, StoreError> {
        let names = match table {
            Some(name) => {
                let result = self.conn.query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [name],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(found) => vec![found],
                    Err(rusqlite::Error::QueryReturnedNoRows) => Vec::new(),
                    Err(e) => return Err(e.into()),
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type = 'table'
                       AND name NOT LIKE 'sqlite_%'
                       AND name NOT LIKE 'messages_fts_%'
                     ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                names
            }
        };

        let mut tables = Vec::new();
        for name in names {
            tables.push(self.table_schema(&name)?);
        }
        Ok(tables)
    }

    fn table_schema(&self, name: &str) -> Result<TableSchema, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1)",
        )?;
        let rows = stmt.query_map([name], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                primary_key: row.get::<_, i64>(3)? != 0,
            })
        })?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1)",
        )?;
        let rows = stmt.query_map([name], |row| {
            Ok(ForeignKeyInfo {
                from_column: row.get(0)?,
                references_table: row.get(1)?,
                references_column: row.get(2)?,
            })
        })?;
        let mut foreign_keys = Vec::new();
        for row in rows {
            foreign_keys.push(row?);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_index_list(?1) ORDER BY name")?;
        let rows = stmt.query_map([name], |row| row.get::<_, String>(0))?;
        let mut indexes = Vec::new();
        for row in rows {
            indexes.push(row?);
        }

        // Table name comes from sqlite_master, not from user input
        let row_count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", name.replace('"', "\"\"")),
            [],
            |row| row.get(0),
        )?;

        Ok(TableSchema {
            name: name.to_string(),
            columns,
            foreign_keys,
            indexes,
            row_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::SessionUpsert;

    #[test]
    fn test_schema_lists_all_tables_without_shadows() {
        let store = Store::open_in_memory().unwrap();
        let tables = store.schema(None).unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();

        for expected in [
            "meta",
            "messages",
            "messages_fts",
            "sessions",
            "sync_state",
            "tool_calls",
            "tool_results",
        ] {
            assert!(names.contains(&expected), "missing table: {}", expected);
        }
        assert!(!names.iter().any(|n| n.starts_with("messages_fts_")));
        assert!(!names.iter().any(|n| n.starts_with("sqlite_")));
    }

    #[test]
    fn test_schema_columns_and_keys() {
        let store = Store::open_in_memory().unwrap();
        let tables = store.schema(Some("messages")).unwrap();
        assert_eq!(tables.len(), 1);
        let messages = &tables[0];

        let uuid = messages
            .columns
            .iter()
            .find(|c| c.name == "uuid")
            .expect("uuid column");
        assert!(uuid.primary_key);
        assert_eq!(uuid.data_type, "TEXT");

        let timestamp = messages
            .columns
            .iter()
            .find(|c| c.name == "timestamp")
            .expect("timestamp column");
        assert!(timestamp.not_null);
        assert!(!timestamp.primary_key);

        assert_eq!(messages.foreign_keys.len(), 1);
        assert_eq!(messages.foreign_keys[0].from_column, "session_id");
        assert_eq!(messages.foreign_keys[0].references_table, "sessions");

        assert!(messages
            .indexes
            .iter()
            .any(|i| i == "idx_messages_session"));
    }

    #[test]
    fn test_schema_row_counts() {
        let store = Store::open_in_memory().unwrap();
        store
            .upsert_session(&SessionUpsert {
                id: "s1".to_string(),
                project_path: "/p".to_string(),
                git_branch: None,
                cwd: None,
                timestamp_ms: 1000,
                summary: None,
            })
            .unwrap();

        let tables = store.schema(Some("sessions")).unwrap();
        assert_eq!(tables[0].row_count, 1);
    }

    #[test]
    fn test_schema_unknown_table_is_empty() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.schema(Some("no_such_table")).unwrap().is_empty());
    }
}
