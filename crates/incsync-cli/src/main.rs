mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "incsync",
    about = "Increment consistency and synchronization engine",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .incsync/ or .git/)
    #[arg(long, global = true, env = "INCSYNC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize increment tracking in the current project
    Init,

    /// Create a new increment
    Create {
        /// Slug part of the id (lowercase, hyphenated)
        slug: String,

        /// Human-readable title (defaults to the slug)
        #[arg(long)]
        title: Option<String>,

        /// Increment type
        #[arg(long, default_value = "feature")]
        r#type: String,

        /// Explicit sequence number (default: next free)
        #[arg(long)]
        number: Option<String>,

        /// Start in planning (writes a spec document) instead of backlog
        #[arg(long)]
        planning: bool,
    },

    /// Pause an active increment
    Pause {
        id: String,

        /// Why work stopped
        #[arg(long)]
        reason: Option<String>,
    },

    /// Resume a paused or abandoned increment
    Resume { id: String },

    /// Abandon an increment (status change only, nothing is deleted)
    Abandon {
        id: String,

        /// Why the work is dropped
        #[arg(long)]
        reason: Option<String>,
    },

    /// Close an increment (requires all tasks complete)
    Close { id: String },

    /// Check status consistency between metadata.json and spec.md
    Check {
        /// Increment id (omit to scan all)
        id: Option<String>,

        /// Repair desyncs from metadata.json (the source of truth)
        #[arg(long)]
        fix: bool,
    },

    /// Detect increment ids materialized in more than one location
    Duplicates,

    /// Re-evaluate automatic status transitions
    Refresh {
        /// Increment id (omit to refresh all)
        id: Option<String>,
    },

    /// Migrate legacy status values to the current set
    Migrate,

    /// List increments with status and task progress
    Status,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Create {
            slug,
            title,
            r#type,
            number,
            planning,
        } => cmd::create::run(
            &root,
            &slug,
            title.as_deref(),
            &r#type,
            number.as_deref(),
            planning,
            cli.json,
        ),
        Commands::Pause { id, reason } => cmd::lifecycle::pause(&root, &id, reason.as_deref()),
        Commands::Resume { id } => cmd::lifecycle::resume(&root, &id),
        Commands::Abandon { id, reason } => cmd::lifecycle::abandon(&root, &id, reason.as_deref()),
        Commands::Close { id } => cmd::lifecycle::close(&root, &id),
        Commands::Check { id, fix } => cmd::check::run(&root, id.as_deref(), fix, cli.json),
        Commands::Duplicates => cmd::duplicates::run(&root, cli.json),
        Commands::Refresh { id } => cmd::refresh::run(&root, id.as_deref(), cli.json),
        Commands::Migrate => cmd::migrate::run(&root, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
