//! Schema command - inspect the index schema

use anyhow::Result;
use recall_store::{Store, TableSchema};
use serde_json::{json, Value};

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json as json_out};

pub fn run(cli: &Cli, store: &Store, table: Option<&str>) -> Result<()> {
    let tables = store.schema(table)?;

    if let Some(name) = table {
        if tables.is_empty() {
            anyhow::bail!("no such table: {}", name);
        }
    }

    match cli.effective_format() {
        OutputFormat::Human => {
            for (i, t) in tables.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_table(t);
            }
        }

        OutputFormat::Json => {
            let output: Vec<Value> = tables.iter().map(table_to_json).collect();
            println!("{}", json_out::emit(&Value::Array(output), cli.pretty));
        }

        OutputFormat::Minimal => {
            for t in &tables {
                println!("{}", t.name);
            }
        }
    }

    Ok(())
}

fn print_table(table: &TableSchema) {
    println!(
        "{} ({} rows)",
        colors::header(&table.name),
        colors::format_count(table.row_count)
    );

    for col in &table.columns {
        let mut line = format!("  {} {}", colors::value(&col.name), col.data_type);
        if col.primary_key {
            line.push_str(" PRIMARY KEY");
        }
        if col.not_null {
            line.push_str(" NOT NULL");
        }
        println!("{}", line);
    }

    if !table.foreign_keys.is_empty() {
        println!("  {}", colors::label("foreign keys:"));
        for fk in &table.foreign_keys {
            let target = match &fk.references_column {
                Some(col) => format!("{}({})", fk.references_table, col),
                None => fk.references_table.clone(),
            };
            println!("    {} -> {}", fk.from_column, target);
        }
    }

    if !table.indexes.is_empty() {
        println!("  {}", colors::label("indexes:"));
        for index in &table.indexes {
            println!("    {}", index);
        }
    }
}

fn table_to_json(table: &TableSchema) -> Value {
    json!({
        "name": table.name,
        "row_count": table.row_count,
        "columns": table.columns.iter().map(|c| json!({
            "name": c.name,
            "type": c.data_type,
            "not_null": c.not_null,
            "primary_key": c.primary_key,
        })).collect::<Vec<Value>>(),
        "foreign_keys": table.foreign_keys.iter().map(|fk| json!({
            "from": fk.from_column,
            "table": fk.references_table,
            "to": fk.references_column,
        })).collect::<Vec<Value>>(),
        "indexes": table.indexes,
    })
}
