//! Search command - full-text search across indexed messages

use anyhow::Result;
use colored::Colorize;
use recall_store::{SearchQuery, Store};
use serde_json::Value;

use crate::cli::{Cli, OutputFormat, SortOrder};
use crate::output::{colors, human, json};

pub fn run(
    cli: &Cli,
    store: &Store,
    query: &str,
    limit: i64,
    project: Option<&str>,
    sort: SortOrder,
) -> Result<()> {
    let mut opts = SearchQuery::new(query)
        .with_limit(limit)
        .with_sort(sort.into());
    if let Some(p) = project {
        opts = opts.with_project(p);
    }

    let hits = store.search(&opts)?;

    match cli.effective_format() {
        OutputFormat::Human => {
            if hits.is_empty() {
                println!("No results found for: {}", query.cyan());
            } else {
                println!(
                    "{}",
                    colors::header(&format!("Search results for '{}' ({})", query, hits.len()))
                );
                println!();

                let use_color = cli.use_color();
                for hit in &hits {
                    println!("{}", human::format_hit(hit, use_color));
                }
            }
        }

        OutputFormat::Json => {
            let output: Vec<Value> = hits.iter().map(json::hit_to_json).collect();
            println!("{}", json::emit(&Value::Array(output), cli.pretty));
        }

        OutputFormat::Minimal => {
            for hit in &hits {
                println!("{}\t{}", hit.session_id, hit.snippet);
            }
        }
    }

    Ok(())
}
