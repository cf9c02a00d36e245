//! Human-readable output formatting

use super::colors::*;
use colored::Colorize;
use recall_store::{MessageRow, SearchHit, SessionOverview};

/// Shorten a session ID for display
pub fn short_session(id: &str) -> &str {
    if id.len() > 8 {
        &id[..8]
    } else {
        id
    }
}

/// Single-line preview of message content
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Format a search hit: session, time, type, then the matched extract
pub fn format_hit(hit: &SearchHit, use_color: bool) -> String {
    let header = if use_color {
        format!(
            "{} {} [{}]",
            colored_session(short_session(&hit.session_id)),
            colored_time(hit.timestamp),
            colored_type(&hit.message_type),
        )
    } else {
        format!(
            "{} {} [{}]",
            short_session(&hit.session_id),
            format_time(hit.timestamp),
            hit.message_type,
        )
    };
    format!("{}\n  {}", header, render_snippet(&hit.snippet, use_color))
}

/// Render a snippet, turning the match markers into highlighting
pub fn render_snippet(snippet: &str, use_color: bool) -> String {
    if !use_color {
        return snippet.to_string();
    }

    let mut out = String::new();
    let mut rest = snippet;
    while let Some(start) = rest.find(">>>") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 3..];
        match after.find("<<<") {
            Some(end) => {
                out.push_str(&after[..end].black().on_yellow().to_string());
                rest = &after[end + 3..];
            }
            None => {
                out.push_str(after);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Format a session for list output
pub fn format_session(session: &SessionOverview, use_color: bool) -> String {
    let id = short_session(&session.id);
    let time = format_time(session.last_timestamp);
    let messages = format_count(session.message_count);
    let title = session
        .summary
        .as_deref()
        .map(|s| preview(s, 60))
        .unwrap_or_else(|| session.project_path.clone());

    if use_color {
        format!(
            "{} {} {:>6} msgs  {}",
            colored_session(id),
            colored_time(session.last_timestamp),
            messages,
            title
        )
    } else {
        format!("{} {} {:>6} msgs  {}", id, time, messages, title)
    }
}

/// Format a message row for context output
pub fn format_message(msg: &MessageRow, use_color: bool) -> String {
    let mut parts = Vec::new();

    if use_color {
        parts.push(colored_time(msg.timestamp));
        parts.push(format!("[{}]", colored_type(&msg.message_type)));
        if let Some(model) = &msg.model {
            parts.push(format!("({})", colored_model(model)));
        }
    } else {
        parts.push(format_time(msg.timestamp));
        parts.push(format!("[{}]", msg.message_type));
        if let Some(model) = &msg.model {
            parts.push(format!("({})", model));
        }
    }

    let header = parts.join(" ");
    match msg.content_text.as_deref() {
        Some(content) if !content.is_empty() => {
            format!("{} {}", header, preview(content, 100))
        }
        _ => header,
    }
}
