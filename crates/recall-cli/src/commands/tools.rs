//! Tools command - tool usage breakdown

use anyhow::Result;
use recall_store::Store;
use serde_json::Value;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

pub fn run(cli: &Cli, store: &Store, project: Option<&str>) -> Result<()> {
    let stats = store.tool_stats(project)?;

    match cli.effective_format() {
        OutputFormat::Human => {
            if stats.is_empty() {
                println!("No tool calls indexed");
            } else {
                let total: i64 = stats.iter().map(|s| s.count).sum();
                println!(
                    "{}",
                    colors::header(&format!("Tool usage ({} calls)", colors::format_count(total)))
                );
                println!();

                for stat in &stats {
                    println!(
                        "  {:>8}  {:>5.1}%  {}",
                        colors::format_count(stat.count),
                        stat.percent,
                        colors::value(&stat.tool_name)
                    );
                }
            }
        }

        OutputFormat::Json => {
            let output: Vec<Value> = stats.iter().map(json::tool_stat_to_json).collect();
            println!("{}", json::emit(&Value::Array(output), cli.pretty));
        }

        OutputFormat::Minimal => {
            for stat in &stats {
                println!("{}\t{}", stat.tool_name, stat.count);
            }
        }
    }

    Ok(())
}
