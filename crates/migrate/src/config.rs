//! Engine configuration
//!
//! A typed, validated configuration structure; the engine never sees raw
//! untyped input. The CLI (or any embedding application) maps its arguments
//! into this before constructing a [`Migrator`](crate::migrator::Migrator).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::MigrateResult;
use crate::security::validate_identifier;

/// Configuration for the migration engine
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Directory where migration files are stored
    pub migrations_dir: PathBuf,
    /// Schema the migrations target
    pub schema: String,
    /// Table name for tracking applied migrations
    pub ledger_table: String,
    /// How long to wait for the schema lock before failing fast
    pub lock_wait: Duration,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            schema: "public".to_string(),
            ledger_table: "strata_migrations".to_string(),
            lock_wait: Duration::from_secs(10),
        }
    }
}

impl MigratorConfig {
    /// Validate identifier fields before anything touches the database
    pub fn validate(&self) -> MigrateResult<()> {
        validate_identifier(&self.schema)?;
        validate_identifier(&self.ledger_table)?;
        Ok(())
    }
}
