//! Command implementations for the strata CLI

mod create;
mod migrate;
mod status;

pub use create::create;
pub use migrate::{migrate_down, migrate_up};
pub use status::status;

use anyhow::Context;
use clap::Args;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::time::Duration;

use strata_migrate::{Migrator, MigratorConfig};

/// Database connection arguments shared by every verb that plans or executes
#[derive(Args)]
pub struct ConnectionArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Schema the migrations target
    #[arg(long, env = "STRATA_SCHEMA", default_value = "public")]
    pub schema: String,

    /// Ledger table name
    #[arg(long, default_value = "strata_migrations")]
    pub table: String,

    /// Directory containing migration files
    #[arg(long, default_value = "migrations")]
    pub path: PathBuf,

    /// Seconds to wait for the schema lock before giving up
    #[arg(long, default_value = "10")]
    pub lock_wait_secs: u64,
}

/// Map CLI arguments into the engine's typed configuration and connect
pub(crate) async fn build_migrator(args: &ConnectionArgs) -> anyhow::Result<Migrator> {
    let config = MigratorConfig {
        migrations_dir: args.path.clone(),
        schema: args.schema.clone(),
        ledger_table: args.table.clone(),
        lock_wait: Duration::from_secs(args.lock_wait_secs),
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&args.database_url)
        .await
        .context("Failed to connect to database")?;

    Ok(Migrator::new(pool, config)?)
}
