//! recall - index and search Claude Code session transcripts

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use recall_store::Store;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Commands that create the index or work without one
    match &cli.command {
        Command::Sync { root } => {
            return commands::sync::run(&cli, root.as_deref());
        }
        Command::Doctor => {
            return commands::doctor::run(&cli);
        }
        _ => {}
    }

    // Query commands need an existing index
    let store = open_existing(&cli)?;

    match &cli.command {
        Command::Search {
            query,
            limit,
            project,
            sort,
        } => commands::search::run(&cli, &store, query, *limit, project.as_deref(), *sort),

        Command::List { limit, project } => {
            commands::list::run(&cli, &store, *limit, project.as_deref())
        }

        Command::Context { session, at, count } => {
            commands::context::run(&cli, &store, session, at, *count)
        }

        Command::Stats => commands::stats::run(&cli, &store),

        Command::Tools { project } => commands::tools::run(&cli, &store, project.as_deref()),

        Command::Schema { table } => commands::schema::run(&cli, &store, table.as_deref()),

        Command::Rebuild => commands::rebuild::run(&cli, &store),

        // Handled above
        Command::Sync { .. } | Command::Doctor => unreachable!(),
    }
}

fn open_existing(cli: &Cli) -> Result<Store> {
    let path = cli.database_path();
    if !path.exists() {
        anyhow::bail!("no index at {}, run `recall sync` first", path.display());
    }
    Ok(Store::open(&path)?)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
