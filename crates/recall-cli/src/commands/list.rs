//! List command - show indexed sessions

use anyhow::Result;
use recall_store::{ListSessionsOptions, Store};
use serde_json::Value;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, human, json};

pub fn run(cli: &Cli, store: &Store, limit: i64, project: Option<&str>) -> Result<()> {
    let mut opts = ListSessionsOptions::new().with_limit(limit);
    if let Some(p) = project {
        opts = opts.with_project(p);
    }

    let sessions = store.sessions(&opts)?;

    match cli.effective_format() {
        OutputFormat::Human => {
            if sessions.is_empty() {
                println!("No sessions found");
            } else {
                println!(
                    "{}",
                    colors::header(&format!("Sessions ({})", sessions.len()))
                );
                println!();

                let use_color = cli.use_color();
                for session in &sessions {
                    println!("{}", human::format_session(session, use_color));
                }
            }
        }

        OutputFormat::Json => {
            let output: Vec<Value> = sessions.iter().map(json::session_to_json).collect();
            println!("{}", json::emit(&Value::Array(output), cli.pretty));
        }

        OutputFormat::Minimal => {
            for session in &sessions {
                println!("{}", session.id);
            }
        }
    }

    Ok(())
}
