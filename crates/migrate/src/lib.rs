//! # strata-migrate: linear SQL schema migrations for PostgreSQL
//!
//! Discovers versioned migration scripts on disk, reconciles them against a
//! ledger table inside the target schema, and applies or reverts them in a
//! deterministic order. Each migration's script and its ledger update commit
//! in one transaction; runs against the same schema are serialized by an
//! advisory lock.
//!
//! The engine takes an explicit `sqlx::PgPool`; connection setup, argument
//! parsing, and schema bootstrapping belong to the embedding application
//! (see the `strata` CLI).

pub mod config;
pub mod definitions;
pub mod error;
pub mod executor;
pub mod generator;
pub mod ledger;
pub mod lock;
pub mod migrator;
pub mod planner;
pub mod security;
pub mod store;

// Re-export core types
pub use config::*;
pub use definitions::*;
pub use error::*;
pub use executor::*;
pub use generator::*;
pub use ledger::*;
pub use lock::*;
pub use migrator::*;
pub use planner::*;
pub use store::*;
