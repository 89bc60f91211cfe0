//! Applied-state ledger
//!
//! Owns the table inside the target schema that records which versions have
//! been applied. The ledger is the sole durable state owned by the engine;
//! `record`/`unrecord` run on the caller's open transaction so the ledger
//! update commits atomically with the script that justified it.

use sqlx::{PgPool, Row};

use crate::config::MigratorConfig;
use crate::definitions::AppliedMigration;
use crate::error::{MigrateError, MigrateResult};
use crate::security::escape_identifier;

/// Tracks applied migrations in a schema-scoped ledger table
#[derive(Debug, Clone)]
pub struct Ledger {
    schema: String,
    table: String,
}

impl Ledger {
    pub fn new(config: &MigratorConfig) -> Self {
        Self {
            schema: config.schema.clone(),
            table: config.ledger_table.clone(),
        }
    }

    /// Fully qualified, identifier-escaped table reference
    fn qualified_table(&self) -> String {
        format!(
            "{}.{}",
            escape_identifier(&self.schema),
            escape_identifier(&self.table)
        )
    }

    /// SQL to create the ledger table
    pub fn ensure_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version VARCHAR(255) PRIMARY KEY,\n    \
                name VARCHAR(255) NOT NULL,\n    \
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()\n\
            );",
            self.qualified_table()
        )
    }

    /// SQL to list applied migrations, ascending by version
    pub fn list_applied_sql(&self) -> String {
        format!(
            "SELECT version, name, applied_at FROM {} ORDER BY version ASC",
            self.qualified_table()
        )
    }

    /// SQL to record a migration as applied
    pub fn record_sql(&self) -> String {
        format!(
            "INSERT INTO {} (version, name) VALUES ($1, $2)",
            self.qualified_table()
        )
    }

    /// SQL to remove a migration record on revert
    pub fn unrecord_sql(&self) -> String {
        format!("DELETE FROM {} WHERE version = $1", self.qualified_table())
    }

    /// Idempotently create the ledger table; safe to call on every run
    pub async fn ensure(&self, pool: &PgPool) -> MigrateResult<()> {
        sqlx::query(&self.ensure_sql())
            .execute(pool)
            .await
            .map_err(|e| MigrateError::Ledger(format!("Failed to create ledger table: {}", e)))?;
        Ok(())
    }

    /// Read the current ledger state, ascending by version
    pub async fn list_applied(&self, pool: &PgPool) -> MigrateResult<Vec<AppliedMigration>> {
        let rows = sqlx::query(&self.list_applied_sql())
            .fetch_all(pool)
            .await
            .map_err(|e| MigrateError::Ledger(format!("Failed to query applied migrations: {}", e)))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let version: String = row
                .try_get("version")
                .map_err(|e| MigrateError::Ledger(format!("Failed to get version: {}", e)))?;
            let name: String = row
                .try_get("name")
                .map_err(|e| MigrateError::Ledger(format!("Failed to get name: {}", e)))?;
            let applied_at: chrono::DateTime<chrono::Utc> = row
                .try_get("applied_at")
                .map_err(|e| MigrateError::Ledger(format!("Failed to get applied_at: {}", e)))?;

            records.push(AppliedMigration {
                version,
                name,
                applied_at,
            });
        }

        Ok(records)
    }

    /// Insert one ledger row; runs on the caller's executor so it can share
    /// the transaction of the up script it accompanies
    pub async fn record<'e, E>(&self, executor: E, version: &str, name: &str) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(&self.record_sql())
            .bind(version)
            .bind(name)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Delete one ledger row; shares the transaction of its down script
    pub async fn unrecord<'e, E>(&self, executor: E, version: &str) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(&self.unrecord_sql())
            .bind(version)
            .execute(executor)
            .await?;
        Ok(())
    }
}
