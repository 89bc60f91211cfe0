//! Run orchestration
//!
//! One migration run is strictly sequential: lock the schema, ensure the
//! ledger, snapshot the catalog and ledger, plan, execute, unlock. No state
//! survives between runs; each invocation loads everything fresh.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::config::MigratorConfig;
use crate::definitions::{Direction, MigrationFile, MigrationStatus, RunOutcome};
use crate::error::MigrateResult;
use crate::executor::Executor;
use crate::ledger::Ledger;
use crate::lock::SchemaLock;
use crate::planner;
use crate::store::MigrationStore;

/// Facade over the migration engine
///
/// Holds the injected pool and the validated configuration; every component
/// receives its handle explicitly from here.
pub struct Migrator {
    pool: PgPool,
    config: MigratorConfig,
    store: MigrationStore,
    ledger: Ledger,
}

impl Migrator {
    /// Build a migrator from a schema-scoped pool and validated configuration
    pub fn new(pool: PgPool, config: MigratorConfig) -> MigrateResult<Self> {
        config.validate()?;
        let store = MigrationStore::new(config.migrations_dir.clone());
        let ledger = Ledger::new(&config);
        Ok(Self {
            pool,
            config,
            store,
            ledger,
        })
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Apply every pending migration, ascending by version
    pub async fn migrate_up(&self) -> MigrateResult<RunOutcome> {
        self.run(Direction::Up, 0).await
    }

    /// Revert the `steps` most recently applied migrations, descending by version
    pub async fn migrate_down(&self, steps: usize) -> MigrateResult<RunOutcome> {
        self.run(Direction::Down, steps).await
    }

    async fn run(&self, direction: Direction, steps: usize) -> MigrateResult<RunOutcome> {
        let lock =
            SchemaLock::acquire(&self.pool, &self.config.schema, self.config.lock_wait).await?;
        let result = self.run_locked(direction, steps).await;
        // The lock's connection closes either way; a failed unlock only
        // matters for the log.
        if let Err(err) = lock.release().await {
            tracing::warn!("Failed to release schema lock: {}", err);
        }
        result
    }

    async fn run_locked(&self, direction: Direction, steps: usize) -> MigrateResult<RunOutcome> {
        self.ledger.ensure(&self.pool).await?;
        let catalog = self.store.discover()?;
        let applied = self.ledger.list_applied(&self.pool).await?;

        let plan = match direction {
            Direction::Up => planner::plan_up(&catalog, &applied)?,
            Direction::Down => planner::plan_down(&catalog, &applied, steps)?,
        };

        if plan.is_empty() {
            tracing::info!("Nothing to do for schema '{}'", self.config.schema);
        }

        let executor = Executor::new(
            self.pool.clone(),
            self.ledger.clone(),
            self.config.schema.clone(),
        );
        executor.run(&plan).await
    }

    /// Every catalog entry paired with its applied/pending state
    ///
    /// Mutates nothing beyond the idempotent ledger DDL; takes no schema lock.
    pub async fn status(&self) -> MigrateResult<Vec<(MigrationFile, MigrationStatus)>> {
        self.ledger.ensure(&self.pool).await?;
        let catalog = self.store.discover()?;
        let applied = self.ledger.list_applied(&self.pool).await?;

        let applied_at: HashMap<&str, chrono::DateTime<chrono::Utc>> = applied
            .iter()
            .map(|record| (record.version.as_str(), record.applied_at))
            .collect();

        Ok(catalog
            .into_iter()
            .map(|migration| {
                let status = match applied_at.get(migration.version.as_str()) {
                    Some(&at) => MigrationStatus::Applied { applied_at: at },
                    None => MigrationStatus::Pending,
                };
                (migration, status)
            })
            .collect())
    }
}
