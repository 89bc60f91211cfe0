//! Cross-invocation serialization
//!
//! Two processes targeting the same schema could otherwise compute the same
//! up plan and double-apply. A session-level advisory lock, keyed on the
//! schema name, is taken before planning and held until execution completes.
//! The key is hashed by Postgres itself (`hashtext`), so every client build
//! agrees on the key for a given schema name.

use std::time::{Duration, Instant};

use sqlx::{Connection, PgConnection, PgPool};

use crate::error::{MigrateError, MigrateResult};

/// Advisory lock namespace for migration runs ("stra" in ASCII)
const LOCK_CLASS_ID: i32 = 0x7374_7261;

/// How often to re-try a contended lock
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Exclusive advisory lock on a schema, held for the duration of a run
///
/// The lock lives on a dedicated connection detached from the pool; if the
/// guard is dropped without [`release`](SchemaLock::release), closing that
/// connection releases the lock server-side.
pub struct SchemaLock {
    conn: PgConnection,
    schema: String,
}

impl SchemaLock {
    /// Acquire the lock, polling until `wait` has elapsed
    ///
    /// Fails fast with a `Lock` error instead of blocking indefinitely when
    /// another run holds the schema.
    pub async fn acquire(pool: &PgPool, schema: &str, wait: Duration) -> MigrateResult<Self> {
        let mut conn = pool
            .acquire()
            .await
            .map_err(|e| {
                MigrateError::Ledger(format!("Failed to acquire connection for schema lock: {}", e))
            })?
            .detach();

        let started = Instant::now();
        loop {
            let acquired: bool =
                sqlx::query_scalar("SELECT pg_try_advisory_lock($1, hashtext($2))")
                    .bind(LOCK_CLASS_ID)
                    .bind(schema)
                    .fetch_one(&mut conn)
                    .await
                    .map_err(|e| {
                        MigrateError::Ledger(format!("Failed to query schema lock: {}", e))
                    })?;

            if acquired {
                tracing::debug!("Acquired schema lock for '{}'", schema);
                return Ok(Self {
                    conn,
                    schema: schema.to_string(),
                });
            }

            let elapsed = started.elapsed();
            if elapsed >= wait {
                // Best-effort close; the server releases nothing since we hold nothing
                let _ = conn.close().await;
                return Err(MigrateError::Lock {
                    schema: schema.to_string(),
                    waited_ms: elapsed.as_millis() as u64,
                });
            }

            let remaining = wait - elapsed;
            tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }

    /// Release the lock and close its connection
    pub async fn release(mut self) -> MigrateResult<()> {
        sqlx::query("SELECT pg_advisory_unlock($1, hashtext($2))")
            .bind(LOCK_CLASS_ID)
            .bind(self.schema.as_str())
            .execute(&mut self.conn)
            .await
            .map_err(|e| MigrateError::Ledger(format!("Failed to release schema lock: {}", e)))?;
        tracing::debug!("Released schema lock for '{}'", self.schema);
        let _ = self.conn.close().await;
        Ok(())
    }
}
