//! Plan computation
//!
//! Pure, synchronous functions over a discovered catalog and the ledger
//! snapshot the caller already read. Nothing here touches the database, and
//! no partial plan is ever produced: a down run that selects an irreversible
//! version fails before anything executes.

use std::collections::BTreeSet;

use crate::definitions::{AppliedMigration, Direction, MigrationFile, MigrationPlan};
use crate::error::{MigrateError, MigrateResult};

/// Compute the up plan: every catalog entry not yet applied, ascending by version
///
/// An empty plan is a valid, non-error outcome (nothing pending).
pub fn plan_up(
    catalog: &[MigrationFile],
    applied: &[AppliedMigration],
) -> MigrateResult<MigrationPlan> {
    check_ledger_consistency(catalog, applied)?;

    let applied_versions: BTreeSet<&str> = applied.iter().map(|a| a.version.as_str()).collect();
    let mut entries: Vec<MigrationFile> = catalog
        .iter()
        .filter(|m| !applied_versions.contains(m.version.as_str()))
        .cloned()
        .collect();
    entries.sort_by(|a, b| a.version.cmp(&b.version));

    Ok(MigrationPlan {
        direction: Direction::Up,
        entries,
    })
}

/// Compute the down plan: the `steps` most recently applied versions,
/// descending by version
///
/// Ordering is by version, not by wall-clock apply time, so the plan is
/// deterministic even under clock skew. Every selected version must have a
/// down script; `steps` beyond the applied count reverts everything applied.
pub fn plan_down(
    catalog: &[MigrationFile],
    applied: &[AppliedMigration],
    steps: usize,
) -> MigrateResult<MigrationPlan> {
    check_ledger_consistency(catalog, applied)?;

    let mut applied_versions: Vec<&str> = applied.iter().map(|a| a.version.as_str()).collect();
    applied_versions.sort_unstable_by(|a, b| b.cmp(a));

    let mut entries = Vec::new();
    for version in applied_versions.into_iter().take(steps) {
        // Lookup cannot fail after the consistency check
        let migration = catalog
            .iter()
            .find(|m| m.version == version)
            .ok_or_else(|| {
                MigrateError::Ledger(format!(
                    "Ledger references unknown migration version {}",
                    version
                ))
            })?;
        if !migration.is_reversible() {
            return Err(MigrateError::StaleMigration {
                version: version.to_string(),
            });
        }
        entries.push(migration.clone());
    }

    Ok(MigrationPlan {
        direction: Direction::Down,
        entries,
    })
}

/// Every recorded version must correspond to a known migration file
///
/// Files live outside the database, so this referential check runs
/// defensively at plan time rather than as a foreign key.
fn check_ledger_consistency(
    catalog: &[MigrationFile],
    applied: &[AppliedMigration],
) -> MigrateResult<()> {
    let known: BTreeSet<&str> = catalog.iter().map(|m| m.version.as_str()).collect();
    for record in applied {
        if !known.contains(record.version.as_str()) {
            return Err(MigrateError::Ledger(format!(
                "Ledger references unknown migration version {} ({})",
                record.version, record.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn file(version: &str, name: &str, reversible: bool) -> MigrationFile {
        MigrationFile {
            version: version.to_string(),
            name: name.to_string(),
            up_sql: format!("CREATE TABLE {} (id INTEGER);", name),
            down_sql: reversible.then(|| format!("DROP TABLE {};", name)),
            up_path: PathBuf::from(format!("{}_{}.up.sql", version, name)),
            down_path: reversible.then(|| PathBuf::from(format!("{}_{}.down.sql", version, name))),
        }
    }

    fn record(version: &str, name: &str) -> AppliedMigration {
        AppliedMigration {
            version: version.to_string(),
            name: name.to_string(),
            applied_at: Utc::now(),
        }
    }

    fn catalog() -> Vec<MigrationFile> {
        vec![
            file("20240101000000", "init", true),
            file("20240102000000", "add_col", true),
            file("20240103000000", "add_index", true),
        ]
    }

    #[test]
    fn test_empty_ledger_plans_everything_ascending() {
        let plan = plan_up(&catalog(), &[]).unwrap();
        assert_eq!(plan.direction, Direction::Up);
        assert_eq!(plan.len(), 3);
        let versions: Vec<&str> = plan.entries.iter().map(|m| m.version.as_str()).collect();
        assert_eq!(
            versions,
            vec!["20240101000000", "20240102000000", "20240103000000"]
        );
    }

    #[test]
    fn test_fully_applied_catalog_plans_nothing() {
        let applied = vec![
            record("20240101000000", "init"),
            record("20240102000000", "add_col"),
            record("20240103000000", "add_index"),
        ];
        let plan = plan_up(&catalog(), &applied).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_partial_ledger_plans_the_remainder() {
        let applied = vec![record("20240101000000", "init")];
        let plan = plan_up(&catalog(), &applied).unwrap();
        let versions: Vec<&str> = plan.entries.iter().map(|m| m.version.as_str()).collect();
        assert_eq!(versions, vec!["20240102000000", "20240103000000"]);
    }

    #[test]
    fn test_down_one_step_selects_most_recent_version() {
        let applied = vec![
            record("20240101000000", "init"),
            record("20240102000000", "add_col"),
            record("20240103000000", "add_index"),
        ];
        let plan = plan_down(&catalog(), &applied, 1).unwrap();
        assert_eq!(plan.direction, Direction::Down);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.entries[0].version, "20240103000000");
    }

    #[test]
    fn test_down_steps_descend_by_version() {
        let applied = vec![
            record("20240101000000", "init"),
            record("20240102000000", "add_col"),
            record("20240103000000", "add_index"),
        ];
        let plan = plan_down(&catalog(), &applied, 2).unwrap();
        let versions: Vec<&str> = plan.entries.iter().map(|m| m.version.as_str()).collect();
        assert_eq!(versions, vec!["20240103000000", "20240102000000"]);
    }

    #[test]
    fn test_down_steps_clamp_to_applied_count() {
        let applied = vec![record("20240101000000", "init")];
        let plan = plan_down(&catalog(), &applied, 10).unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_down_zero_steps_is_empty_plan() {
        let applied = vec![record("20240101000000", "init")];
        let plan = plan_down(&catalog(), &applied, 0).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_only_selected_versions_need_down_scripts() {
        // init is irreversible, but a one-step down never selects it
        let catalog = vec![
            file("20240101000000", "init", false),
            file("20240102000000", "add_col", true),
            file("20240103000000", "add_index", true),
        ];
        let applied = vec![
            record("20240101000000", "init"),
            record("20240102000000", "add_col"),
            record("20240103000000", "add_index"),
        ];
        let plan = plan_down(&catalog, &applied, 1).unwrap();
        assert_eq!(plan.entries[0].version, "20240103000000");
    }

    #[test]
    fn test_irreversible_selection_fails_closed() {
        let catalog = vec![
            file("20240101000000", "init", true),
            file("20240102000000", "add_col", false),
        ];
        let applied = vec![
            record("20240101000000", "init"),
            record("20240102000000", "add_col"),
        ];
        let err = plan_down(&catalog, &applied, 2).unwrap_err();
        match err {
            MigrateError::StaleMigration { version } => {
                assert_eq!(version, "20240102000000");
            }
            other => panic!("expected StaleMigration, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_ledger_version_fails_planning() {
        let applied = vec![record("20230101000000", "ghost")];
        assert!(matches!(
            plan_up(&catalog(), &applied),
            Err(MigrateError::Ledger(_))
        ));
        assert!(matches!(
            plan_down(&catalog(), &applied, 1),
            Err(MigrateError::Ledger(_))
        ));
    }
}
