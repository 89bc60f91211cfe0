//! Plan execution
//!
//! Runs a plan entry-at-a-time in plan order; later migrations may assume the
//! schema state left by earlier ones, so entries are never parallelized. Each
//! entry's script and its ledger update share one transaction: both commit or
//! neither does. A failing entry aborts the remainder of the plan, leaving
//! every previously committed entry in place.

use sqlx::PgPool;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::definitions::{Direction, MigrationFile, MigrationPlan, RunOutcome};
use crate::error::{MigrateError, MigrateResult};
use crate::ledger::Ledger;
use crate::security::escape_identifier;

/// Executes a plan against the database
pub struct Executor {
    pool: PgPool,
    ledger: Ledger,
    schema: String,
}

impl Executor {
    pub fn new(pool: PgPool, ledger: Ledger, schema: impl Into<String>) -> Self {
        Self {
            pool,
            ledger,
            schema: schema.into(),
        }
    }

    /// Run the plan to completion or first failure
    ///
    /// An empty plan returns success with zero applied and performs no
    /// database writes.
    pub async fn run(&self, plan: &MigrationPlan) -> MigrateResult<RunOutcome> {
        let start_time = std::time::Instant::now();

        let mut applied_versions = Vec::with_capacity(plan.len());
        for migration in &plan.entries {
            self.run_entry(migration, plan.direction).await?;
            applied_versions.push(migration.version.clone());
        }

        Ok(RunOutcome {
            applied_count: applied_versions.len(),
            applied_versions,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    async fn run_entry(&self, migration: &MigrationFile, direction: Direction) -> MigrateResult<()> {
        let script = match direction {
            Direction::Up => migration.up_sql.as_str(),
            // The planner rejects irreversible selections before execution
            Direction::Down => migration.down_sql.as_deref().unwrap_or_default(),
        };

        match direction {
            Direction::Up => {
                tracing::info!("Applying migration: {} - {}", migration.version, migration.name)
            }
            Direction::Down => {
                tracing::info!("Reverting migration: {} - {}", migration.version, migration.name)
            }
        }

        let execution_error = |e: sqlx::Error| MigrateError::Execution {
            version: migration.version.clone(),
            source: e,
        };

        let mut transaction = self.pool.begin().await.map_err(execution_error)?;

        // Scope the transaction to the target schema before the script runs
        let set_search_path = format!("SET LOCAL search_path TO {}", escape_identifier(&self.schema));
        sqlx::query(&set_search_path)
            .execute(&mut *transaction)
            .await
            .map_err(execution_error)?;

        if !script.trim().is_empty() {
            for statement in split_statements(script) {
                if !statement.trim().is_empty() {
                    sqlx::query(&statement)
                        .execute(&mut *transaction)
                        .await
                        .map_err(execution_error)?;
                }
            }
        }

        match direction {
            Direction::Up => self
                .ledger
                .record(&mut *transaction, &migration.version, &migration.name)
                .await
                .map_err(execution_error)?,
            Direction::Down => self
                .ledger
                .unrecord(&mut *transaction, &migration.version)
                .await
                .map_err(execution_error)?,
        }

        transaction.commit().await.map_err(execution_error)?;
        Ok(())
    }
}

/// Split a script into individual statements for execution
///
/// Postgres rejects multiple statements in one prepared query, so scripts are
/// parsed apart first. Falls back to naive semicolon splitting when the
/// parser cannot handle a dialect-specific construct.
pub fn split_statements(sql: &str) -> Vec<String> {
    let dialect = GenericDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(parsed) => parsed.into_iter().map(|stmt| format!("{};", stmt)).collect(),
        Err(e) => {
            tracing::warn!("SQL parsing failed, using naive semicolon splitting: {}", e);
            sql.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| format!("{};", s))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigratorConfig;

    #[test]
    fn test_split_statements() {
        let sql = "CREATE TABLE t (id INTEGER); CREATE INDEX idx ON t (id);";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE TABLE"));
        assert!(statements[1].contains("CREATE INDEX"));
        assert!(statements.iter().all(|s| s.ends_with(';')));
    }

    #[test]
    fn test_split_statements_naive_fallback() {
        // Not parseable as generic SQL; falls back to semicolon splitting
        let sql = "CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\" !!; SELECT 1;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_split_statements_empty_input() {
        assert!(split_statements("").is_empty());
        assert!(split_statements("  \n ;; ").is_empty());
    }

    #[tokio::test]
    async fn test_empty_plan_is_a_no_op() {
        // connect_lazy never opens a connection; an empty plan must not need one
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let config = MigratorConfig::default();
        let executor = Executor::new(pool, Ledger::new(&config), config.schema.clone());

        let plan = MigrationPlan {
            direction: Direction::Up,
            entries: Vec::new(),
        };
        let outcome = executor.run(&plan).await.unwrap();
        assert_eq!(outcome.applied_count, 0);
        assert!(outcome.applied_versions.is_empty());
    }
}
