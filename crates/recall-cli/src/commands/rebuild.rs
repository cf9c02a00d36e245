//! Rebuild command - regenerate the full-text index

use anyhow::Result;
use recall_store::Store;
use serde_json::json;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json as json_out};

pub fn run(cli: &Cli, store: &Store) -> Result<()> {
    store.rebuild_fts()?;
    let stats = store.stats()?;

    match cli.effective_format() {
        OutputFormat::Human => {
            println!(
                "{}",
                colors::success(&format!(
                    "Search index rebuilt from {} messages",
                    colors::format_count(stats.messages)
                ))
            );
        }

        OutputFormat::Json => {
            let output = json!({
                "status": "ok",
                "messages": stats.messages,
            });
            println!("{}", json_out::emit(&output, cli.pretty));
        }

        OutputFormat::Minimal => {
            println!("ok");
        }
    }

    Ok(())
}
