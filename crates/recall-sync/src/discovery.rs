//! File discovery for transcript JSONL files

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default projects directory (~/.claude/projects)
pub fn default_projects_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
    PathBuf::from(home).join(".claude").join("projects")
}

/// Find all transcript JSONL files under a root directory.
///
/// Returns sorted paths so a run visits files in a stable order.
/// A missing root yields an empty list, not an error.
pub fn find_transcript_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".jsonl") {
                    files.push(path.to_path_buf());
                }
            }
        }
    }

    files.sort();
    files
}
