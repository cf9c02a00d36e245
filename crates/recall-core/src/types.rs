//! Core type definitions for transcript records

use serde::{Deserialize, Serialize};

/// Token usage statistics for a message
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u64>,
}

impl TokenUsage {
    /// Total tokens used (input + output + cache)
    pub fn total(&self) -> u64 {
        self.input_tokens
            + self.output_tokens
            + self.cache_creation_input_tokens.unwrap_or(0)
            + self.cache_read_input_tokens.unwrap_or(0)
    }
}

/// Content block types that can appear in messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: bool,
    },
    Thinking {
        thinking: String,
        #[serde(default)]
        signature: Option<String>,
    },
    /// Block types this crate does not model (images, attachments, ...).
    /// Kept verbatim so re-serialization loses nothing.
    #[serde(untagged)]
    Other(serde_json::Value),
}

/// Message structure within a transcript record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Message content can be a string or array of content blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Extract text content from message
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Blocks(blocks) => {
                let mut parts = Vec::new();
                for block in blocks {
                    if let ContentBlock::Text { text } = block {
                        parts.push(text.clone());
                    }
                }
                parts.join("\n")
            }
        }
    }

    /// Extract thinking content from message
    pub fn thinking_text(&self) -> String {
        let mut parts = Vec::new();
        if let MessageContent::Blocks(blocks) = self {
            for block in blocks {
                if let ContentBlock::Thinking { thinking, .. } = block {
                    parts.push(thinking.clone());
                }
            }
        }
        parts.join("\n")
    }

    /// Get all tool uses from content
    pub fn tool_uses(&self) -> Vec<(&str, &str, &serde_json::Value)> {
        let mut tools = Vec::new();
        if let MessageContent::Blocks(blocks) = self {
            for block in blocks {
                if let ContentBlock::ToolUse { id, name, input } = block {
                    tools.push((id.as_str(), name.as_str(), input));
                }
            }
        }
        tools
    }

    /// Get all tool results from content
    pub fn tool_results(&self) -> Vec<(&str, &serde_json::Value, bool)> {
        let mut results = Vec::new();
        if let MessageContent::Blocks(blocks) = self {
            for block in blocks {
                if let ContentBlock::ToolResult { tool_use_id, content, is_error } = block {
                    results.push((tool_use_id.as_str(), content, *is_error));
                }
            }
        }
        results
    }

    /// Check if content is a block array
    pub fn is_blocks(&self) -> bool {
        matches!(self, MessageContent::Blocks(_))
    }
}

/// Flatten a tool result payload into display text.
///
/// Tool results arrive as a plain string, a block array, or an arbitrary
/// JSON value depending on the tool. Null means the tool produced no output.
pub fn tool_result_text(content: &serde_json::Value) -> Option<String> {
    match content {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let mut parts = Vec::new();
            for item in items {
                if let Some(text) = item.get("text").and_then(|v| v.as_str()) {
                    parts.push(text.to_string());
                }
            }
            if parts.is_empty() {
                serde_json::to_string(content).ok()
            } else {
                Some(parts.join("\n"))
            }
        }
        other => serde_json::to_string(other).ok(),
    }
}

/// A transcript timestamp, either epoch milliseconds or an RFC 3339 string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Text(String),
}

impl Timestamp {
    /// Normalize to epoch milliseconds
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Timestamp::Millis(ms) => Some(*ms),
            Timestamp::Text(s) => chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp_millis()),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Millis(ms) => write!(f, "{}", ms),
            Timestamp::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Raw transcript line with all fields, as written by the producer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(rename = "parentUuid", default)]
    pub parent_uuid: Option<String>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(rename = "gitBranch", default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub message: Option<TranscriptMessage>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// A record normalized for ingestion
#[derive(Debug, Clone)]
pub enum TranscriptRecord {
    /// A session summary line
    Summary(SummaryRecord),
    /// Everything else (user, assistant, system, ...)
    Message(MessageRecord),
}

/// Summary attached to a session
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    /// Owning session, when the line names one. Summary lines written at
    /// the top of a transcript often do not; the ingester attributes those
    /// to the file's session.
    pub session_id: Option<String>,
    pub summary: String,
}

/// A normalized message with its extracted secondary entities
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub uuid: String,
    pub session_id: String,
    pub parent_uuid: Option<String>,
    pub record_type: String,
    pub model: Option<String>,
    /// Joined text blocks (or the plain string content)
    pub content_text: Option<String>,
    /// Structured content re-serialized, when the source was a block array
    pub content_json: Option<String>,
    /// Joined thinking blocks
    pub thinking: Option<String>,
    /// Epoch milliseconds
    pub timestamp_ms: i64,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub usage: Option<TokenUsage>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub tool_results: Vec<ToolResultRecord>,
}

/// Tool invocation extracted from a message's content blocks
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub input_json: Option<String>,
}

/// Tool result extracted from a message's content blocks
#[derive(Debug, Clone)]
pub struct ToolResultRecord {
    pub tool_use_id: String,
    pub content: Option<String>,
    pub is_error: bool,
}
