//! Stats command - index statistics

use anyhow::Result;
use recall_store::{Store, DB_VERSION};
use serde_json::json;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json as json_out};

pub fn run(cli: &Cli, store: &Store) -> Result<()> {
    let stats = store.stats()?;
    let db_path = cli.database_path();
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", colors::header("Index Status"));
            println!();
            println!("  {}: {}", colors::label("Database"), db_path.display());
            println!(
                "  {}: {}",
                colors::label("Size"),
                colors::format_size(db_size)
            );
            println!(
                "  {}: {}",
                colors::label("Schema version"),
                colors::value(&DB_VERSION.to_string())
            );
            println!();
            println!(
                "  {}: {}",
                colors::label("Sessions"),
                colors::format_count(stats.sessions)
            );
            println!(
                "  {}: {}",
                colors::label("Messages"),
                colors::format_count(stats.messages)
            );
            println!(
                "  {}: {}",
                colors::label("Tool calls"),
                colors::format_count(stats.tool_calls)
            );
            println!(
                "  {}: {}",
                colors::label("Tool results"),
                colors::format_count(stats.tool_results)
            );
            println!();
            println!(
                "  {}: {}",
                colors::label("Input tokens"),
                colors::format_count(stats.input_tokens)
            );
            println!(
                "  {}: {}",
                colors::label("Output tokens"),
                colors::format_count(stats.output_tokens)
            );
            println!(
                "  {}: {}",
                colors::label("Cache read tokens"),
                colors::format_count(stats.cache_read_tokens)
            );
            println!(
                "  {}: {}",
                colors::label("Cache creation tokens"),
                colors::format_count(stats.cache_creation_tokens)
            );
            println!(
                "  {}: {}",
                colors::label("Total tokens"),
                colors::format_count(stats.total_tokens())
            );
        }

        OutputFormat::Json => {
            let output = json!({
                "db_path": db_path.to_string_lossy(),
                "db_size_bytes": db_size,
                "version": DB_VERSION,
                "sessions": stats.sessions,
                "messages": stats.messages,
                "tool_calls": stats.tool_calls,
                "tool_results": stats.tool_results,
                "input_tokens": stats.input_tokens,
                "output_tokens": stats.output_tokens,
                "cache_read_tokens": stats.cache_read_tokens,
                "cache_creation_tokens": stats.cache_creation_tokens,
                "total_tokens": stats.total_tokens(),
            });
            println!("{}", json_out::emit(&output, cli.pretty));
        }

        OutputFormat::Minimal => {
            println!("{}", stats.messages);
        }
    }

    Ok(())
}
