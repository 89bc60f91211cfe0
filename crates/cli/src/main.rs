mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::ConnectionArgs;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Linear SQL schema migrations for PostgreSQL", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new migration file pair
    Create {
        /// Migration name
        name: String,

        /// Directory containing migration files
        #[arg(long, default_value = "migrations")]
        path: PathBuf,
    },

    /// Apply all pending migrations
    Up {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Revert the most recently applied migrations
    Down {
        /// How many applied migrations to revert
        #[arg(long, default_value = "1")]
        steps: usize,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Show applied and pending migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Create { name, path } => commands::create(&name, &path),
        Commands::Up { connection } => commands::migrate_up(&connection).await,
        Commands::Down { steps, connection } => commands::migrate_down(&connection, steps).await,
        Commands::Status { json, connection } => commands::status(&connection, json).await,
    }
}
