//! Billet CLI - self-hosted notes over HTTP

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod templates;

use commands::{migrate, serve, status};

/// Billet - self-hosted notes over HTTP
#[derive(Parser)]
#[command(name = "billet", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where notes live. Defaults to a DuckDB file in the billet directory;
/// `--flat-dir` switches to one-file-per-note storage.
#[derive(Args)]
struct StoreArgs {
    /// Path to the database file
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Store notes as flat files under this directory instead of a database
    #[arg(long, conflicts_with = "db_path")]
    flat_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations and serve the note API
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to serve the application on
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Access credentials in the form "username:password"
        #[arg(long)]
        creds: Option<String>,

        /// Path to a file holding one "username:password" pair per line
        #[arg(long)]
        creds_file: Option<PathBuf>,

        /// Notes not viewed in this many days are deleted (0 = never expire)
        #[arg(long, default_value_t = billet_core::config::DEFAULT_EXPIRY_DAYS)]
        note_expiry: u64,

        /// Number of recent notes shown on the index page
        #[arg(long, default_value_t = billet_core::config::DEFAULT_RECENT_NOTES)]
        recent_notes: usize,
    },

    /// Apply pending schema migrations, then exit
    Migrate {
        /// Path to the database file
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Read migration scripts from this directory instead of the
        /// embedded baseline
        #[arg(long)]
        schema_dir: Option<PathBuf>,
    },

    /// Show recent notes
    Status {
        #[command(flatten)]
        store: StoreArgs,

        /// Number of notes to list
        #[arg(long, default_value_t = billet_core::config::DEFAULT_RECENT_NOTES)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            store,
            host,
            port,
            creds,
            creds_file,
            note_expiry,
            recent_notes,
        } => {
            serve::run(
                store,
                &host,
                port,
                creds.as_deref(),
                creds_file.as_deref(),
                note_expiry,
                recent_notes,
            )
            .await
        }
        Commands::Migrate {
            db_path,
            schema_dir,
        } => migrate::run(db_path, schema_dir),
        Commands::Status { store, limit, json } => status::run(store, limit, json),
    }
}
