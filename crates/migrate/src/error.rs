//! Error types for the migration engine
//!
//! One error enum covers the whole engine; discovery and planning failures
//! abort before any database mutation, execution failures abort the
//! remainder of a plan while leaving committed entries intact.

/// Result type alias for engine operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Error types for migration operations
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A migration definition on disk is malformed or inconsistent
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// The ledger table could not be created, queried, or reconciled
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// A down run selected a version that has no down script
    #[error("Migration {version} has no down script and cannot be reverted")]
    StaleMigration { version: String },

    /// A script or ledger write failed mid-plan; earlier entries stay committed
    #[error("Migration {version} failed: {source}")]
    Execution {
        version: String,
        #[source]
        source: sqlx::Error,
    },

    /// Another run holds the schema lock
    #[error("Could not acquire migration lock for schema '{schema}' within {waited_ms}ms")]
    Lock { schema: String, waited_ms: u64 },

    /// The generator's target files already exist
    #[error("Migration files for '{0}' already exist")]
    NameConflict(String),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Filesystem error while reading or writing migration files
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
