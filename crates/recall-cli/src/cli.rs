//! CLI argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use recall_store::SearchSort;
use std::path::PathBuf;

/// CLI for indexing and searching Claude Code transcripts
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(version)]
#[command(about = "Index and search Claude Code session transcripts")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Custom database path
    #[arg(long, global = true, env = "RECALL_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Output format (auto-detects based on TTY if not specified)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Output raw JSON (alias for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON with indentation
    #[arg(long, short = 'p', global = true)]
    pub pretty: bool,

    /// Force color output
    #[arg(long, global = true)]
    pub color: bool,

    /// Disable color output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Get the effective output format
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            return OutputFormat::Json;
        }
        if let Some(f) = self.format {
            return f;
        }
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::Human
        } else {
            OutputFormat::Json
        }
    }

    /// Check if colors should be used
    pub fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        if self.color {
            return true;
        }
        atty::is(atty::Stream::Stdout)
    }

    /// The database path, explicit or default
    pub fn database_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }
}

/// Default index location: ~/.recall/index.db
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".recall")
        .join("index.db")
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
    /// Minimal text output (content only)
    Minimal,
}

/// Result ordering for search
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Best match first
    #[default]
    Relevance,
    /// Oldest match first
    Oldest,
    /// Newest match first
    Newest,
}

impl From<SortOrder> for SearchSort {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Relevance => SearchSort::Relevance,
            SortOrder::Oldest => SearchSort::Oldest,
            SortOrder::Newest => SearchSort::Newest,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan transcript files and update the index
    Sync {
        /// Transcript root directory (defaults to ~/.claude/projects)
        #[arg(long, env = "RECALL_ROOT")]
        root: Option<PathBuf>,
    },

    /// Full-text search across indexed messages
    Search {
        /// Search query
        query: String,

        /// Limit results
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,

        /// Only sessions whose project path starts with this prefix
        #[arg(long)]
        project: Option<String>,

        /// Result ordering
        #[arg(long, value_enum, default_value = "relevance")]
        sort: SortOrder,
    },

    /// List indexed sessions, most recent first
    List {
        /// Number of sessions to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,

        /// Only sessions whose project path starts with this prefix
        #[arg(long)]
        project: Option<String>,
    },

    /// Show the messages around a point in time within a session
    Context {
        /// Session ID
        session: String,

        /// Anchor timestamp (epoch milliseconds or RFC 3339)
        #[arg(long)]
        at: String,

        /// Messages to show on each side of the anchor
        #[arg(short = 'n', long, default_value = "5")]
        count: i64,
    },

    /// Show index statistics
    Stats,

    /// Show tool usage breakdown
    Tools {
        /// Only sessions whose project path starts with this prefix
        #[arg(long)]
        project: Option<String>,
    },

    /// Inspect the index schema
    Schema {
        /// Table name (all tables when omitted)
        table: Option<String>,
    },

    /// Rebuild the full-text index from stored messages
    Rebuild,

    /// Diagnose the indexing pipeline
    Doctor,
}
