//! Doctor command - diagnose the indexing pipeline

use anyhow::Result;
use recall_store::{Store, DB_VERSION};
use serde_json::json;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json as json_out};

pub fn run(cli: &Cli) -> Result<()> {
    let mut checks: Vec<Check> = Vec::new();

    // Check 1: Database file exists
    let db_path = cli.database_path();
    let db_exists = db_path.exists();
    checks.push(Check {
        name: "Database file".to_string(),
        passed: db_exists,
        details: if db_exists {
            format!("Found at {}", db_path.display())
        } else {
            format!("Not found at {}", db_path.display())
        },
    });

    // Check 2: Database can be opened. Only attempted when the file
    // exists, opening would otherwise create an empty index here.
    let store = if db_exists {
        Store::open(&db_path).ok()
    } else {
        None
    };
    checks.push(Check {
        name: "Database opens".to_string(),
        passed: store.is_some(),
        details: if store.is_some() {
            "Successfully opened".to_string()
        } else if db_exists {
            "Failed to open (corruption?)".to_string()
        } else {
            "Skipped, no database file".to_string()
        },
    });

    // Check 3: Schema version
    if let Some(ref store) = store {
        let version = schema_version(store);
        match version {
            Some(v) => {
                checks.push(Check {
                    name: "Schema version".to_string(),
                    passed: v >= DB_VERSION,
                    details: format!("v{} (expected >= v{})", v, DB_VERSION),
                });
            }
            None => {
                checks.push(Check {
                    name: "Schema version".to_string(),
                    passed: false,
                    details: "No version row in meta table".to_string(),
                });
            }
        }
    }

    // Check 4: FTS table exists
    if let Some(ref store) = store {
        let fts_ok = check_fts_table(store);
        checks.push(Check {
            name: "FTS table".to_string(),
            passed: fts_ok,
            details: if fts_ok {
                "messages_fts table exists".to_string()
            } else {
                "messages_fts table missing".to_string()
            },
        });
    }

    // Check 5: Has data
    if let Some(ref store) = store {
        match store.stats() {
            Ok(stats) => {
                let has_data = stats.messages > 0;
                checks.push(Check {
                    name: "Has data".to_string(),
                    passed: has_data,
                    details: if has_data {
                        format!(
                            "{} messages in {} sessions",
                            colors::format_count(stats.messages),
                            colors::format_count(stats.sessions)
                        )
                    } else {
                        "No messages indexed".to_string()
                    },
                });
            }
            Err(e) => {
                checks.push(Check {
                    name: "Has data".to_string(),
                    passed: false,
                    details: format!("Query failed: {}", e),
                });
            }
        }
    }

    // Check 6: Transcript source directory
    let projects_dir = recall_sync::default_projects_dir();
    let projects_exist = projects_dir.exists();
    checks.push(Check {
        name: "Transcript source".to_string(),
        passed: projects_exist,
        details: if projects_exist {
            format!("Found at {}", projects_dir.display())
        } else {
            format!("Not found at {}", projects_dir.display())
        },
    });

    // Output results
    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", colors::header("Recall Doctor"));
            println!();

            let all_passed = checks.iter().all(|c| c.passed);

            for check in &checks {
                let status = if check.passed {
                    colors::success(&check.name)
                } else {
                    colors::error(&check.name)
                };
                println!("  {} - {}", status, check.details);
            }

            println!();
            if all_passed {
                println!("{}", colors::success("All checks passed"));
            } else {
                println!("{}", colors::error("Some checks failed"));
                println!();
                println!("To fix:");
                if !db_exists {
                    println!("  1. Run: recall sync");
                } else {
                    println!("  1. Run: recall rebuild");
                    println!("  2. If that fails, delete the database and run: recall sync");
                }
            }
        }

        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|c| json!({
                    "name": c.name,
                    "passed": c.passed,
                    "details": c.details
                })).collect::<Vec<_>>(),
                "all_passed": checks.iter().all(|c| c.passed)
            });
            println!("{}", json_out::emit(&output, cli.pretty));
        }

        OutputFormat::Minimal => {
            let failed: Vec<_> = checks.iter().filter(|c| !c.passed).collect();
            if failed.is_empty() {
                println!("ok");
            } else {
                for c in failed {
                    println!("FAIL: {}", c.name);
                }
            }
        }
    }

    Ok(())
}

struct Check {
    name: String,
    passed: bool,
    details: String,
}

fn schema_version(store: &Store) -> Option<i32> {
    store
        .connection()
        .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
            row.get::<_, String>(0)
        })
        .ok()
        .and_then(|v| v.parse().ok())
}

fn check_fts_table(store: &Store) -> bool {
    let result: std::result::Result<i64, _> = store.connection().query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'messages_fts'",
        [],
        |row| row.get(0),
    );
    matches!(result, Ok(1))
}
