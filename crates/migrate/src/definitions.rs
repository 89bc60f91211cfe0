//! Core types for the migration engine
//!
//! Defines the fundamental types used throughout the migration system
//! including MigrationFile, AppliedMigration, and MigrationPlan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A migration definition discovered on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Sortable version token, a 14-digit UTC timestamp (`YYYYMMDDHHMMSS`)
    pub version: String,
    /// Human-readable name for the migration
    pub name: String,
    /// SQL statements to apply the migration
    pub up_sql: String,
    /// SQL statements to revert the migration; absent for irreversible migrations
    pub down_sql: Option<String>,
    /// Location of the up script
    pub up_path: PathBuf,
    /// Location of the down script, if one exists
    pub down_path: Option<PathBuf>,
}

impl MigrationFile {
    /// Whether this migration can be reverted
    pub fn is_reversible(&self) -> bool {
        self.down_sql.is_some()
    }
}

/// One ledger row: a version that has been applied to the schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedMigration {
    /// Migration version
    pub version: String,
    /// Name recorded at apply time
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// Direction of plan execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Apply migrations (run up scripts)
    Up,
    /// Revert migrations (run down scripts)
    Down,
}

/// Ordered, validated list of migrations to execute in one run
///
/// Up plans ascend by version and contain only unapplied entries; down plans
/// descend by version and contain only applied entries with a down script.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub direction: Direction,
    pub entries: Vec<MigrationFile>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Applied/pending state of a single version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Migration is pending (not yet applied)
    Pending,
    /// Migration has been applied
    Applied {
        /// When it was applied
        applied_at: DateTime<Utc>,
    },
}

/// Result of executing a plan
#[derive(Debug)]
pub struct RunOutcome {
    /// Number of migrations that were executed
    pub applied_count: usize,
    /// Versions that were executed, in execution order
    pub applied_versions: Vec<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}
