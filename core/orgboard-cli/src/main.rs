//! orgboard: command-line client for the dashboard state store.
//!
//! Loads the store from the data directory, applies one command, and
//! flushes mutations back on exit. All persistence semantics (merge
//! recovery, autosave, backups) live in orgboard-core; this binary is a
//! thin consumer.

mod commands;
mod export;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use orgboard_core::{ApplicationStateStore, FileStorage, Priority, Stream};

#[derive(Parser)]
#[command(name = "orgboard")]
#[command(about = "Organizational quality dashboard, stored locally")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to ~/.orgboard)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a one-screen overview of the organization
    Summary,

    /// Manage teams
    #[command(subcommand)]
    Team(TeamCommand),

    /// Manage personnel
    #[command(subcommand)]
    Person(PersonCommand),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Search teams, personnel, and tasks
    Search {
        query: String,

        /// Show the uncapped per-category breakdown
        #[arg(long)]
        grouped: bool,
    },

    /// Compute analytics; optionally store today's report
    Analytics {
        /// Store the result as today's daily report
        #[arg(long)]
        snapshot: bool,
    },

    /// Manage notifications
    #[command(subcommand)]
    Notification(NotificationCommand),

    /// Export data as JSON or CSV
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Entity to export in CSV mode (JSON always exports everything)
        #[arg(long, value_enum, default_value = "tasks")]
        entity: ExportEntity,

        /// Write to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Force an immediate save
    Flush,
}

#[derive(Subcommand)]
enum TeamCommand {
    List,
    Add {
        name: String,

        /// Organizational stream (functional, automation, performance,
        /// security, operations)
        #[arg(long, default_value = "functional")]
        stream: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        responsibilities: String,

        /// Performance score, 0-100
        #[arg(long, default_value_t = 0)]
        performance: u8,
    },
    Remove {
        id: u64,
    },
}

#[derive(Subcommand)]
enum PersonCommand {
    Add {
        name: String,

        /// Id of the team to add this person to
        #[arg(long)]
        team: u64,

        #[arg(long, default_value = "")]
        role: String,

        #[arg(long, default_value = "")]
        client: String,
    },
    Remove {
        id: u64,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    List,
    Add {
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Due date as YYYY-MM-DD (defaults to one week out)
        #[arg(long, value_name = "DATE")]
        due: Option<String>,

        #[arg(long, value_enum, default_value = "medium")]
        priority: PriorityArg,

        /// Assignee name (free text; not validated against personnel)
        #[arg(long, default_value = "")]
        assigned_to: String,
    },
    /// Set completion percentage (status follows: 100 completes the task)
    Progress {
        id: u64,
        percent: u8,
    },
    Remove {
        id: u64,
    },
}

#[derive(Subcommand)]
enum NotificationCommand {
    List,
    Read { id: u64 },
    ReadAll,
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportEntity {
    Teams,
    Personnel,
    Tasks,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses a stream label, listing the valid ones on failure.
fn parse_stream(label: &str) -> Result<Stream, String> {
    Stream::from_label(label).ok_or_else(|| {
        let known: Vec<&str> = Stream::ALL.iter().map(|s| s.as_label()).collect();
        format!("unknown stream '{label}' (expected one of: {})", known.join(", "))
    })
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let root = cli
        .data_dir
        .or_else(|| env::var_os("ORGBOARD_DATA_DIR").map(PathBuf::from))
        .or_else(FileStorage::default_root);
    let root = match root {
        Some(root) => root,
        None => {
            error!("Could not determine a data directory; pass --data-dir");
            return ExitCode::FAILURE;
        }
    };

    let mut store = ApplicationStateStore::load(FileStorage::new(root));

    match commands::run(&mut store, cli.command) {
        Ok(mutated) => {
            if mutated {
                store.flush_now();
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            // Rejected mutations and bad arguments both land here; the
            // store itself never raises persistence errors.
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
