//! Resumable JSONL parsing for transcript files
//!
//! Transcript files are append-only. `RecordCursor` reads them from a byte
//! offset and reports, for every record it yields, the offset of the first
//! byte after that record's line. Persisting that offset lets a later pass
//! resume exactly where this one stopped.

use crate::types::{
    MessageRecord, RawRecord, SummaryRecord, TokenUsage, ToolCallRecord, ToolResultRecord,
    TranscriptRecord, tool_result_text,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Why a transcript line could not be turned into a record
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid UTF-8")]
    Utf8,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unparseable timestamp `{0}`")]
    BadTimestamp(String),
}

/// Parse a single transcript line into a normalized record
pub fn parse_record(raw: &str) -> Result<TranscriptRecord, RecordError> {
    let parsed: RawRecord = serde_json::from_str(raw)?;

    if parsed.r#type.as_deref() == Some("summary") {
        let summary = parsed.summary.ok_or(RecordError::MissingField("summary"))?;
        return Ok(TranscriptRecord::Summary(SummaryRecord {
            session_id: parsed.session_id,
            summary,
        }));
    }

    let uuid = parsed.uuid.ok_or(RecordError::MissingField("uuid"))?;
    let session_id = parsed
        .session_id
        .ok_or(RecordError::MissingField("sessionId"))?;
    let timestamp = parsed
        .timestamp
        .ok_or(RecordError::MissingField("timestamp"))?;
    let timestamp_ms = timestamp
        .as_millis()
        .ok_or_else(|| RecordError::BadTimestamp(timestamp.to_string()))?;

    let record_type = parsed.r#type.unwrap_or_else(|| "unknown".to_string());

    let mut model = None;
    let mut usage: Option<TokenUsage> = None;
    let mut content_text = None;
    let mut content_json = None;
    let mut thinking = None;
    let mut tool_calls = Vec::new();
    let mut tool_results = Vec::new();

    if let Some(message) = parsed.message {
        model = message.model;
        usage = message.usage;

        let text = message.content.as_text();
        if !text.is_empty() {
            content_text = Some(text);
        }
        let think = message.content.thinking_text();
        if !think.is_empty() {
            thinking = Some(think);
        }
        if message.content.is_blocks() {
            content_json = serde_json::to_string(&message.content).ok();
        }

        for (id, name, input) in message.content.tool_uses() {
            tool_calls.push(ToolCallRecord {
                id: id.to_string(),
                name: name.to_string(),
                input_json: serde_json::to_string(input).ok(),
            });
        }
        for (tool_use_id, content, is_error) in message.content.tool_results() {
            tool_results.push(ToolResultRecord {
                tool_use_id: tool_use_id.to_string(),
                content: tool_result_text(content),
                is_error,
            });
        }
    }

    Ok(TranscriptRecord::Message(MessageRecord {
        uuid,
        session_id,
        parent_uuid: parsed.parent_uuid,
        record_type,
        model,
        content_text,
        content_json,
        thinking,
        timestamp_ms,
        cwd: parsed.cwd,
        git_branch: parsed.git_branch,
        usage,
        tool_calls,
        tool_results,
    }))
}

/// A forward-only reader over a transcript file, starting at a byte offset.
///
/// Yields `(record, next_offset)` pairs where `next_offset` is the position
/// just past the record's newline. Malformed lines are skipped with a
/// warning. An unterminated trailing line ends iteration without being
/// consumed, so [`RecordCursor::offset`] never points into the middle of a
/// line that a writer is still appending.
pub struct RecordCursor {
    reader: BufReader<File>,
    path: PathBuf,
    offset: u64,
    done: bool,
}

impl RecordCursor {
    /// Open a transcript file at the given byte offset (0 for the start)
    pub fn open(path: &Path, from_offset: u64) -> io::Result<Self> {
        let mut file = File::open(path)?;
        if from_offset > 0 {
            file.seek(SeekFrom::Start(from_offset))?;
        }
        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            offset: from_offset,
            done: false,
        })
    }

    /// The offset just past the last fully consumed line
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Iterator for RecordCursor {
    type Item = io::Result<(TranscriptRecord, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let mut buf = Vec::new();
            let n = match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => n,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };

            if buf.last() != Some(&b'\n') {
                // Partial trailing line, the writer is mid-append. Stop
                // without advancing so the next pass re-reads it whole.
                self.done = true;
                return None;
            }

            let line_start = self.offset;
            self.offset += n as u64;

            let text = match std::str::from_utf8(&buf) {
                Ok(t) => t.trim(),
                Err(_) => {
                    warn!(
                        path = %self.path.display(),
                        offset = line_start,
                        error = %RecordError::Utf8,
                        "skipping malformed transcript line"
                    );
                    continue;
                }
            };
            if text.is_empty() {
                continue;
            }

            match parse_record(text) {
                Ok(record) => return Some(Ok((record, self.offset))),
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        offset = line_start,
                        error = %err,
                        "skipping malformed transcript line"
                    );
                }
            }
        }
    }
}
