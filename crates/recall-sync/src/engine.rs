//! The sync engine
//!
//! One run scans every transcript under the root, replays new content into
//! the store, and advances per-file cursors. The whole run is a single
//! transaction owned by the store: a crash or read failure rolls back to
//! the pre-run state, never to something partial.

use recall_core::{MessageRecord, RecordCursor, SummaryRecord, TranscriptRecord};
use recall_store::{SessionUpsert, Store, StoreError, SyncCursor};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::{debug, info};

/// Sync engine errors
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// What a sync run did
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub files_seen: usize,
    pub files_synced: usize,
    pub files_skipped: usize,
    pub records_parsed: usize,
    pub messages_inserted: usize,
    pub tool_calls_inserted: usize,
    pub tool_results_inserted: usize,
    pub summaries_applied: usize,
    /// True when the run dropped all cursors to backfill tool entities
    pub cursors_reset: bool,
}

/// Scans a root directory of transcripts into a store.
///
/// Callers must not start two runs against the same store concurrently;
/// the run transaction is BEGIN IMMEDIATE, so a second writer fails fast
/// at begin instead of deadlocking mid-run.
pub struct SyncEngine {
    root: PathBuf,
}

impl SyncEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one sync pass
    pub fn run(&self, store: &Store) -> Result<SyncOutcome, SyncError> {
        let files = crate::discovery::find_transcript_files(&self.root);

        store.begin_run()?;
        match self.run_inner(store, &files) {
            Ok(outcome) => {
                store.commit_run()?;
                info!(
                    files_seen = outcome.files_seen,
                    files_synced = outcome.files_synced,
                    messages_inserted = outcome.messages_inserted,
                    "sync run committed"
                );
                Ok(outcome)
            }
            Err(err) => {
                let _ = store.abort_run();
                Err(err)
            }
        }
    }

    fn run_inner(&self, store: &Store, files: &[PathBuf]) -> Result<SyncOutcome, SyncError> {
        let mut outcome = SyncOutcome {
            cursors_reset: repair_missing_tool_entities(store)?,
            ..SyncOutcome::default()
        };

        for path in files {
            outcome.files_seen += 1;
            self.sync_file(store, path, &mut outcome)?;
        }
        Ok(outcome)
    }

    fn sync_file(
        &self,
        store: &Store,
        path: &Path,
        outcome: &mut SyncOutcome,
    ) -> Result<(), SyncError> {
        let path_str = path.to_string_lossy().to_string();
        let metadata = std::fs::metadata(path)?;
        let mtime_ms = mtime_epoch_ms(&metadata);

        let cursor = store.sync_cursor(&path_str)?;
        if let Some(cursor) = &cursor {
            // mtime is the only change signal; an in-place rewrite that
            // leaves it untouched stays invisible until the next bump
            if cursor.last_modified_ms >= mtime_ms {
                debug!(path = %path.display(), "unchanged since last pass");
                outcome.files_skipped += 1;
                return Ok(());
            }
        }

        let from_offset = cursor.map(|c| c.byte_offset).unwrap_or(0);
        let mut records = RecordCursor::open(path, from_offset)?;

        // Summary lines can precede the session they describe, and the
        // ones at the top of a file usually name no session at all. Hold
        // them until the file's messages are in.
        let mut pending_summaries: Vec<SummaryRecord> = Vec::new();
        let mut file_session: Option<String> = None;

        for item in records.by_ref() {
            let (record, _) = item?;
            outcome.records_parsed += 1;
            match record {
                TranscriptRecord::Message(msg) => {
                    if file_session.is_none() {
                        file_session = Some(msg.session_id.clone());
                    }
                    self.apply_message(store, path, &msg, outcome)?;
                }
                TranscriptRecord::Summary(summary) => {
                    pending_summaries.push(summary);
                }
            }
        }

        for summary in pending_summaries {
            self.apply_summary(store, path, &summary, file_session.as_deref(), outcome)?;
        }

        store.set_sync_cursor(
            &path_str,
            &SyncCursor {
                last_modified_ms: mtime_ms,
                byte_offset: records.offset(),
            },
        )?;
        outcome.files_synced += 1;
        Ok(())
    }

    fn apply_message(
        &self,
        store: &Store,
        path: &Path,
        msg: &MessageRecord,
        outcome: &mut SyncOutcome,
    ) -> Result<(), SyncError> {
        // Session first so the message's foreign key always has a target
        store.upsert_session(&SessionUpsert {
            id: msg.session_id.clone(),
            project_path: project_path_for(path, msg.cwd.as_deref()),
            git_branch: msg.git_branch.clone(),
            cwd: msg.cwd.clone(),
            timestamp_ms: msg.timestamp_ms,
            summary: None,
        })?;

        if store.insert_message(msg)? {
            outcome.messages_inserted += 1;
        }
        for call in &msg.tool_calls {
            if store.insert_tool_call(msg, call)? {
                outcome.tool_calls_inserted += 1;
            }
        }
        for result in &msg.tool_results {
            if store.insert_tool_result(msg, result)? {
                outcome.tool_results_inserted += 1;
            }
        }
        Ok(())
    }

    fn apply_summary(
        &self,
        store: &Store,
        path: &Path,
        summary: &SummaryRecord,
        file_session: Option<&str>,
        outcome: &mut SyncOutcome,
    ) -> Result<(), SyncError> {
        // Attribution order: the session the line names, then the file's
        // session, then the file stem (transcripts are named by session id)
        let stem = path.file_stem().and_then(|s| s.to_str());
        let target = summary
            .session_id
            .as_deref()
            .or(file_session)
            .or(stem)
            .unwrap_or_default();

        if store.set_session_summary(target, &summary.summary)? {
            outcome.summaries_applied += 1;
        } else {
            debug!(
                path = %path.display(),
                session = target,
                "dropping summary for unknown session"
            );
        }
        Ok(())
    }
}

/// Backfill check for indexes that predate tool entity extraction.
///
/// When messages exist but no tool entities do, every cursor is dropped so
/// this run re-reads all files from byte zero. Nothing is deleted; the
/// replayed messages are absorbed by insert-or-ignore while the tool
/// entities land for the first time.
fn repair_missing_tool_entities(store: &Store) -> Result<bool, SyncError> {
    if store.count_messages()? > 0 && store.count_tool_entities()? == 0 {
        let cleared = store.clear_sync_cursors()?;
        info!(
            cursors_cleared = cleared,
            "index predates tool extraction, re-scanning every file"
        );
        return Ok(true);
    }
    Ok(false)
}

fn mtime_epoch_ms(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Project attribution: the record's working directory when present, else
/// the transcript's parent directory name. The producer encodes the project
/// path into that name with '/' replaced by '-', so `-home-jane-app`
/// decodes to `/home/jane/app`.
fn project_path_for(path: &Path, cwd: Option<&str>) -> String {
    if let Some(cwd) = cwd {
        return cwd.to_string();
    }

    let dir_name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if let Some(stripped) = dir_name.strip_prefix('-') {
        format!("/{}", stripped.replace('-', "/"))
    } else if dir_name.is_empty() {
        "unknown".to_string()
    } else {
        dir_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn user_line(uuid: &str, session: &str, ts: i64, text: &str) -> String {
        format!(
            r#"{{"type":"user","uuid":"{uuid}","sessionId":"{session}","timestamp":{ts},"cwd":"/home/jane/app","message":{{"role":"user","content":"{text}"}}}}"#
        )
    }

    fn assistant_tool_line(uuid: &str, session: &str, ts: i64, tool_id: &str) -> String {
        format!(
            r#"{{"type":"assistant","uuid":"{uuid}","sessionId":"{session}","timestamp":{ts},"cwd":"/home/jane/app","message":{{"role":"assistant","model":"claude-3","usage":{{"input_tokens":5,"output_tokens":7}},"content":[{{"type":"text","text":"running it"}},{{"type":"tool_use","id":"{tool_id}","name":"Bash","input":{{"command":"ls"}}}}]}}}}"#
        )
    }

    fn tool_result_line(uuid: &str, session: &str, ts: i64, tool_id: &str) -> String {
        format!(
            r#"{{"type":"user","uuid":"{uuid}","sessionId":"{session}","timestamp":{ts},"message":{{"role":"user","content":[{{"type":"tool_result","tool_use_id":"{tool_id}","content":"file-a","is_error":false}}]}}}}"#
        )
    }

    fn write_lines(path: &Path, lines: &[String]) {
        fs::write(path, lines.join("\n") + "\n").unwrap();
    }

    fn append_lines(path: &Path, lines: &[String]) {
        let mut f = fs::OpenOptions::new().append(true).open(path).unwrap();
        f.write_all((lines.join("\n") + "\n").as_bytes()).unwrap();
    }

    /// Rewind a file's stored mtime so the next run re-reads it from its
    /// byte offset. Appends within the same millisecond as the previous
    /// pass would otherwise be skipped.
    fn force_recheck(store: &Store, path: &Path) {
        let path_str = path.to_string_lossy().to_string();
        let cursor = store.sync_cursor(&path_str).unwrap().unwrap();
        store
            .set_sync_cursor(
                &path_str,
                &SyncCursor {
                    last_modified_ms: 0,
                    byte_offset: cursor.byte_offset,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_sync_indexes_messages_sessions_and_tools() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("s1.jsonl");
        write_lines(
            &file,
            &[
                user_line("u1", "s1", 1000, "please list the files"),
                assistant_tool_line("u2", "s1", 2000, "tool-1"),
                tool_result_line("u3", "s1", 3000, "tool-1"),
            ],
        );

        let store = Store::open_in_memory().unwrap();
        let outcome = SyncEngine::new(tmp.path()).run(&store).unwrap();

        assert_eq!(outcome.files_seen, 1);
        assert_eq!(outcome.files_synced, 1);
        assert_eq!(outcome.messages_inserted, 3);
        assert_eq!(outcome.tool_calls_inserted, 1);
        assert_eq!(outcome.tool_results_inserted, 1);
        assert!(!outcome.cursors_reset);

        let stats = store.stats().unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.messages, 3);
        assert_eq!(stats.input_tokens, 5);
        assert_eq!(stats.output_tokens, 7);

        let sessions = store
            .sessions(&recall_store::ListSessionsOptions::new())
            .unwrap();
        assert_eq!(sessions[0].id, "s1");
        assert_eq!(sessions[0].project_path, "/home/jane/app");
        assert_eq!(sessions[0].first_timestamp, 1000);
        assert_eq!(sessions[0].last_timestamp, 3000);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("s1.jsonl");
        write_lines(
            &file,
            &[
                user_line("u1", "s1", 1000, "first"),
                user_line("u2", "s1", 2000, "second"),
            ],
        );

        let store = Store::open_in_memory().unwrap();
        let engine = SyncEngine::new(tmp.path());

        let first = engine.run(&store).unwrap();
        assert_eq!(first.messages_inserted, 2);

        // Unchanged file: skipped outright
        let second = engine.run(&store).unwrap();
        assert_eq!(second.messages_inserted, 0);
        assert_eq!(second.files_skipped, 1);
        assert_eq!(store.count_messages().unwrap(), 2);

        // Even a forced re-read inserts nothing new
        force_recheck(&store, &file);
        let cursor_before = store
            .sync_cursor(&file.to_string_lossy())
            .unwrap()
            .unwrap();
        let third = engine.run(&store).unwrap();
        assert_eq!(third.messages_inserted, 0);
        let cursor_after = store
            .sync_cursor(&file.to_string_lossy())
            .unwrap()
            .unwrap();
        assert_eq!(cursor_before.byte_offset, cursor_after.byte_offset);
        assert_eq!(store.count_messages().unwrap(), 2);
    }

    #[test]
    fn test_sync_resumes_from_byte_offset() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("s1.jsonl");
        write_lines(&file, &[user_line("u1", "s1", 1000, "first")]);

        let store = Store::open_in_memory().unwrap();
        let engine = SyncEngine::new(tmp.path());
        engine.run(&store).unwrap();

        append_lines(
            &file,
            &[
                user_line("u2", "s1", 2000, "second"),
                user_line("u3", "s1", 3000, "third"),
            ],
        );
        force_recheck(&store, &file);

        let outcome = engine.run(&store).unwrap();
        assert_eq!(outcome.messages_inserted, 2);
        assert_eq!(store.count_messages().unwrap(), 3);

        // The session's span now covers the appended records
        let sessions = store
            .sessions(&recall_store::ListSessionsOptions::new())
            .unwrap();
        assert_eq!(sessions[0].last_timestamp, 3000);
    }

    #[test]
    fn test_sync_holds_back_partial_trailing_line() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("s1.jsonl");
        let full = user_line("u1", "s1", 1000, "whole");
        let partial = r#"{"type":"user","uuid":"u2","s"#;
        fs::write(&file, format!("{}\n{}", full, partial)).unwrap();

        let store = Store::open_in_memory().unwrap();
        let engine = SyncEngine::new(tmp.path());
        engine.run(&store).unwrap();
        assert_eq!(store.count_messages().unwrap(), 1);

        let cursor = store
            .sync_cursor(&file.to_string_lossy())
            .unwrap()
            .unwrap();
        assert_eq!(cursor.byte_offset, full.len() as u64 + 1);

        // Writer finishes the line; the next pass picks it up whole
        let rest =
            "essionId\":\"s1\",\"timestamp\":2000,\"message\":{\"role\":\"user\",\"content\":\"finished\"}}\n";
        let mut f = fs::OpenOptions::new().append(true).open(&file).unwrap();
        f.write_all(rest.as_bytes()).unwrap();
        force_recheck(&store, &file);

        let outcome = engine.run(&store).unwrap();
        assert_eq!(outcome.messages_inserted, 1);
        assert_eq!(store.count_messages().unwrap(), 2);
    }

    #[test]
    fn test_sync_applies_summary_written_before_messages() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("s1.jsonl");
        let lines = vec![
            r#"{"type":"summary","summary":"Fixed the login flow"}"#.to_string(),
            user_line("u1", "s1", 1000, "hello"),
        ];
        write_lines(&file, &lines);

        let store = Store::open_in_memory().unwrap();
        let outcome = SyncEngine::new(tmp.path()).run(&store).unwrap();
        assert_eq!(outcome.summaries_applied, 1);

        let sessions = store
            .sessions(&recall_store::ListSessionsOptions::new())
            .unwrap();
        assert_eq!(sessions[0].summary.as_deref(), Some("Fixed the login flow"));
    }

    #[test]
    fn test_sync_drops_summary_for_unknown_session() {
        let tmp = tempfile::tempdir().unwrap();
        // File stem does not match any session and no messages follow
        let file = tmp.path().join("orphan.jsonl");
        write_lines(
            &file,
            &[r#"{"type":"summary","summary":"floating"}"#.to_string()],
        );

        let store = Store::open_in_memory().unwrap();
        let outcome = SyncEngine::new(tmp.path()).run(&store).unwrap();
        assert_eq!(outcome.summaries_applied, 0);
        assert_eq!(store.stats().unwrap().sessions, 0);
    }

    #[test]
    fn test_sync_summary_attributed_via_file_stem() {
        let tmp = tempfile::tempdir().unwrap();

        // First pass establishes the session
        let file = tmp.path().join("s1.jsonl");
        write_lines(&file, &[user_line("u1", "s1", 1000, "hello")]);
        let store = Store::open_in_memory().unwrap();
        let engine = SyncEngine::new(tmp.path());
        engine.run(&store).unwrap();

        // Later pass sees only an unattributed summary
        append_lines(
            &file,
            &[r#"{"type":"summary","summary":"wrap up"}"#.to_string()],
        );
        force_recheck(&store, &file);
        let outcome = engine.run(&store).unwrap();
        assert_eq!(outcome.summaries_applied, 1);

        let sessions = store
            .sessions(&recall_store::ListSessionsOptions::new())
            .unwrap();
        assert_eq!(sessions[0].summary.as_deref(), Some("wrap up"));
    }

    #[test]
    fn test_sync_repairs_index_missing_tool_entities() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("s1.jsonl");
        write_lines(
            &file,
            &[
                user_line("u1", "s1", 1000, "run it"),
                assistant_tool_line("u2", "s1", 2000, "tool-1"),
                tool_result_line("u3", "s1", 3000, "tool-1"),
            ],
        );

        let store = Store::open_in_memory().unwrap();
        let engine = SyncEngine::new(tmp.path());
        engine.run(&store).unwrap();
        assert_eq!(store.count_tool_entities().unwrap(), 2);

        // Simulate an index written before tool extraction existed
        store
            .connection()
            .execute_batch("DELETE FROM tool_calls; DELETE FROM tool_results;")
            .unwrap();
        assert_eq!(store.count_tool_entities().unwrap(), 0);

        let outcome = engine.run(&store).unwrap();
        assert!(outcome.cursors_reset);
        assert_eq!(outcome.messages_inserted, 0);
        assert_eq!(outcome.tool_calls_inserted, 1);
        assert_eq!(outcome.tool_results_inserted, 1);
        assert_eq!(store.count_messages().unwrap(), 3);
        assert_eq!(store.count_tool_entities().unwrap(), 2);
    }

    #[test]
    fn test_sync_project_path_decoded_from_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let project_dir = tmp.path().join("-home-jane-app");
        fs::create_dir_all(&project_dir).unwrap();
        let file = project_dir.join("s1.jsonl");

        // No cwd on the record, attribution falls back to the dir name
        let line =
            r#"{"type":"user","uuid":"u1","sessionId":"s1","timestamp":1000,"message":{"role":"user","content":"hi"}}"#;
        write_lines(&file, &[line.to_string()]);

        let store = Store::open_in_memory().unwrap();
        SyncEngine::new(tmp.path()).run(&store).unwrap();

        let sessions = store
            .sessions(&recall_store::ListSessionsOptions::new())
            .unwrap();
        assert_eq!(sessions[0].project_path, "/home/jane/app");
    }

    #[test]
    fn test_sync_missing_root_is_empty_run() {
        let store = Store::open_in_memory().unwrap();
        let outcome = SyncEngine::new("/nonexistent/path").run(&store).unwrap();
        assert_eq!(outcome.files_seen, 0);
        assert_eq!(outcome.messages_inserted, 0);
    }

    #[test]
    fn test_sync_skips_malformed_lines_without_failing() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("s1.jsonl");
        let lines = vec![
            user_line("u1", "s1", 1000, "good"),
            "garbage that is not json".to_string(),
            user_line("u2", "s1", 2000, "also good"),
        ];
        write_lines(&file, &lines);

        let store = Store::open_in_memory().unwrap();
        let outcome = SyncEngine::new(tmp.path()).run(&store).unwrap();
        assert_eq!(outcome.messages_inserted, 2);

        // The cursor still reaches the end of the file
        let cursor = store
            .sync_cursor(&file.to_string_lossy())
            .unwrap()
            .unwrap();
        let size = fs::metadata(&file).unwrap().len();
        assert_eq!(cursor.byte_offset, size);
    }
}
