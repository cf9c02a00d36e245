//! Sync command - scan transcripts and update the index

use anyhow::Result;
use recall_store::Store;
use recall_sync::SyncEngine;
use serde_json::json;
use std::path::Path;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json as json_out};

pub fn run(cli: &Cli, root: Option<&Path>) -> Result<()> {
    let db_path = cli.database_path();
    let store = Store::open(&db_path)?;
    let root = root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(recall_sync::default_projects_dir);

    let outcome = SyncEngine::new(&root).run(&store)?;

    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", colors::header("Sync"));
            println!();
            println!("  {}: {}", colors::label("Root"), root.display());
            println!("  {}: {}", colors::label("Database"), db_path.display());
            println!();
            println!(
                "  {}: {} seen, {} synced, {} skipped",
                colors::label("Files"),
                outcome.files_seen,
                outcome.files_synced,
                outcome.files_skipped
            );
            println!(
                "  {}: {} records, {} new messages",
                colors::label("Parsed"),
                colors::format_count(outcome.records_parsed as i64),
                colors::format_count(outcome.messages_inserted as i64)
            );
            println!(
                "  {}: {} calls, {} results",
                colors::label("Tools"),
                colors::format_count(outcome.tool_calls_inserted as i64),
                colors::format_count(outcome.tool_results_inserted as i64)
            );
            if outcome.summaries_applied > 0 {
                println!(
                    "  {}: {}",
                    colors::label("Summaries"),
                    outcome.summaries_applied
                );
            }

            println!();
            if outcome.cursors_reset {
                println!(
                    "{}",
                    colors::warning("Re-read all files to backfill tool entities")
                );
            }
            println!("{}", colors::success("Index up to date"));
        }

        OutputFormat::Json => {
            let output = json!({
                "root": root.to_string_lossy(),
                "db_path": db_path.to_string_lossy(),
                "files_seen": outcome.files_seen,
                "files_synced": outcome.files_synced,
                "files_skipped": outcome.files_skipped,
                "records_parsed": outcome.records_parsed,
                "messages_inserted": outcome.messages_inserted,
                "tool_calls_inserted": outcome.tool_calls_inserted,
                "tool_results_inserted": outcome.tool_results_inserted,
                "summaries_applied": outcome.summaries_applied,
                "cursors_reset": outcome.cursors_reset,
            });
            println!("{}", json_out::emit(&output, cli.pretty));
        }

        OutputFormat::Minimal => {
            println!("{}", outcome.messages_inserted);
        }
    }

    Ok(())
}
