//! recall-sync - Incremental transcript ingestion
//!
//! Discovers transcript files under a root directory and replays their new
//! content into a [`recall_store::Store`]. A sync run is one transaction:
//! it either lands completely or not at all, and replaying the same content
//! twice changes nothing.

pub mod discovery;
pub mod engine;

pub use discovery::{default_projects_dir, find_transcript_files};
pub use engine::{SyncEngine, SyncError, SyncOutcome};
