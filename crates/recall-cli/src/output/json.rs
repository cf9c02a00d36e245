//! JSON output formatting

use recall_store::{MessageRow, SearchHit, SessionOverview, ToolStat};
use serde_json::{json, Value};

/// Serialize a value, pretty or compact
pub fn emit(value: &Value, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_default()
    } else {
        value.to_string()
    }
}

pub fn hit_to_json(hit: &SearchHit) -> Value {
    json!({
        "uuid": hit.uuid,
        "session_id": hit.session_id,
        "project_path": hit.project_path,
        "type": hit.message_type,
        "timestamp": hit.timestamp,
        "snippet": hit.snippet,
        "score": hit.score,
    })
}

pub fn session_to_json(session: &SessionOverview) -> Value {
    json!({
        "id": session.id,
        "project_path": session.project_path,
        "git_branch": session.git_branch,
        "summary": session.summary,
        "first_timestamp": session.first_timestamp,
        "last_timestamp": session.last_timestamp,
        "message_count": session.message_count,
        "total_tokens": session.total_tokens,
    })
}

pub fn message_to_json(msg: &MessageRow) -> Value {
    json!({
        "uuid": msg.uuid,
        "session_id": msg.session_id,
        "parent_uuid": msg.parent_uuid,
        "type": msg.message_type,
        "model": msg.model,
        "content": msg.content_text,
        "thinking": msg.thinking,
        "timestamp": msg.timestamp,
        "input_tokens": msg.input_tokens,
        "output_tokens": msg.output_tokens,
    })
}

pub fn tool_stat_to_json(stat: &ToolStat) -> Value {
    json!({
        "tool_name": stat.tool_name,
        "count": stat.count,
        "percent": stat.percent,
    })
}
