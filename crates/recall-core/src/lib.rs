//! recall-core - Record model and parsing for Claude Code transcripts
//!
//! This crate provides the types for representing session transcript records
//! (one JSON object per line, one file per session) and a resumable cursor
//! that reads records from a byte offset without ever consuming a partially
//! written trailing line.

pub mod parser;
pub mod types;

pub use parser::*;
pub use types::*;
