//! Context command - show messages around a point in time

use anyhow::Result;
use recall_store::Store;
use serde_json::{json, Value};

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, human, json as json_out};

pub fn run(cli: &Cli, store: &Store, session: &str, at: &str, count: i64) -> Result<()> {
    let anchor = parse_anchor(at)?;
    let window = store.messages_around(session, anchor, count)?;

    match cli.effective_format() {
        OutputFormat::Human => {
            if window.before.is_empty() && window.after.is_empty() {
                println!(
                    "No messages around {} in session {}",
                    colors::format_time(anchor),
                    session
                );
                return Ok(());
            }

            let use_color = cli.use_color();
            for msg in &window.before {
                println!("{}", human::format_message(msg, use_color));
            }

            let marker = format!("----- {} -----", colors::format_time(anchor));
            if use_color {
                println!("{}", colors::label(&marker));
            } else {
                println!("{}", marker);
            }

            for msg in &window.after {
                println!("{}", human::format_message(msg, use_color));
            }
        }

        OutputFormat::Json => {
            let output = json!({
                "session_id": session,
                "anchor": anchor,
                "before": window.before.iter().map(json_out::message_to_json).collect::<Vec<Value>>(),
                "after": window.after.iter().map(json_out::message_to_json).collect::<Vec<Value>>(),
            });
            println!("{}", json_out::emit(&output, cli.pretty));
        }

        OutputFormat::Minimal => {
            for msg in window.before.iter().chain(window.after.iter()) {
                if let Some(content) = &msg.content_text {
                    println!("{}", content);
                }
            }
        }
    }

    Ok(())
}

/// Anchor timestamps come in as epoch milliseconds or RFC 3339 text
fn parse_anchor(at: &str) -> Result<i64> {
    if !at.is_empty() && at.chars().all(|c| c.is_ascii_digit()) {
        return Ok(at.parse()?);
    }

    match chrono::DateTime::parse_from_rfc3339(at) {
        Ok(parsed) => Ok(parsed.timestamp_millis()),
        Err(_) => anyhow::bail!(
            "invalid --at value '{}', expected epoch milliseconds or RFC 3339",
            at
        ),
    }
}
