//! Migration discovery
//!
//! Parses a directory of paired `.up.sql`/`.down.sql` definitions into an
//! ordered in-memory catalog. Discovery is read-only with respect to the
//! database; every run loads a fresh snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::definitions::MigrationFile;
use crate::error::{MigrateError, MigrateResult};

pub const UP_SUFFIX: &str = ".up.sql";
pub const DOWN_SUFFIX: &str = ".down.sql";

/// Version tokens are UTC timestamps rendered as `YYYYMMDDHHMMSS`
pub const VERSION_LEN: usize = 14;

/// Discovers and parses migration definitions on disk
pub struct MigrationStore {
    migrations_dir: PathBuf,
}

struct PendingEntry {
    name: String,
    up_path: Option<PathBuf>,
    down_path: Option<PathBuf>,
}

impl MigrationStore {
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Load all migration definitions, sorted ascending by version
    ///
    /// A missing directory yields an empty catalog. Fails on a duplicate
    /// version, a malformed version token, or a down script with no matching
    /// up script.
    pub fn discover(&self) -> MigrateResult<Vec<MigrationFile>> {
        if !self.migrations_dir.exists() {
            return Ok(Vec::new());
        }

        let mut catalog: BTreeMap<String, PendingEntry> = BTreeMap::new();
        let entries = fs::read_dir(&self.migrations_dir).map_err(|e| {
            MigrateError::Discovery(format!("Failed to read migrations directory: {}", e))
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                MigrateError::Discovery(format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            let file_name = match path.file_name().and_then(|s| s.to_str()) {
                Some(name) => name,
                None => {
                    return Err(MigrateError::Discovery(format!(
                        "Migration file name is not valid UTF-8: {}",
                        path.display()
                    )))
                }
            };

            let (stem, is_down) = if let Some(stem) = file_name.strip_suffix(UP_SUFFIX) {
                (stem, false)
            } else if let Some(stem) = file_name.strip_suffix(DOWN_SUFFIX) {
                (stem, true)
            } else if path.extension().is_some_and(|ext| ext == "sql") {
                // An unrecognized .sql file is more likely a misnamed
                // migration than clutter; fail closed instead of skipping it.
                return Err(MigrateError::Discovery(format!(
                    "Migration file '{}' must be named <version>_<name>{} or <version>_<name>{}",
                    file_name, UP_SUFFIX, DOWN_SUFFIX
                )));
            } else {
                tracing::debug!("Ignoring non-migration file: {}", file_name);
                continue;
            };

            let (version, name) = parse_stem(stem, file_name)?;
            let slot = catalog.entry(version.clone()).or_insert_with(|| PendingEntry {
                name: name.clone(),
                up_path: None,
                down_path: None,
            });
            if slot.name != name {
                return Err(MigrateError::Discovery(format!(
                    "Duplicate version {}: used by both '{}' and '{}'",
                    version, slot.name, name
                )));
            }
            if is_down {
                slot.down_path = Some(path);
            } else {
                slot.up_path = Some(path);
            }
        }

        let mut migrations = Vec::with_capacity(catalog.len());
        for (version, entry) in catalog {
            let up_path = entry.up_path.ok_or_else(|| {
                MigrateError::Discovery(format!(
                    "Version {} ({}) has a down script but no up script",
                    version, entry.name
                ))
            })?;
            let up_sql = read_script(&up_path)?;
            let (down_sql, down_path) = match entry.down_path {
                Some(path) => (Some(read_script(&path)?), Some(path)),
                None => (None, None),
            };
            migrations.push(MigrationFile {
                version,
                name: entry.name,
                up_sql,
                down_sql,
                up_path,
                down_path,
            });
        }

        Ok(migrations)
    }
}

fn read_script(path: &Path) -> MigrateResult<String> {
    fs::read_to_string(path).map_err(|e| {
        MigrateError::Discovery(format!(
            "Failed to read migration file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Split a file stem into its version token and name
fn parse_stem(stem: &str, file_name: &str) -> MigrateResult<(String, String)> {
    let (version, name) = stem.split_once('_').ok_or_else(|| {
        MigrateError::Discovery(format!(
            "Migration file '{}' must follow <version>_<name>",
            file_name
        ))
    })?;
    if version.len() != VERSION_LEN || !version.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MigrateError::Discovery(format!(
            "Malformed version token '{}' in '{}' (expected {} digits)",
            version, file_name, VERSION_LEN
        )));
    }
    if name.is_empty() {
        return Err(MigrateError::Discovery(format!(
            "Migration file '{}' has an empty name",
            file_name
        )));
    }
    Ok((version.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_pair(dir: &Path, version: &str, name: &str, up: &str, down: &str) {
        fs::write(dir.join(format!("{}_{}.up.sql", version, name)), up).unwrap();
        fs::write(dir.join(format!("{}_{}.down.sql", version, name)), down).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let store = MigrationStore::new(temp_dir.path().join("does_not_exist"));
        assert!(store.discover().unwrap().is_empty());
    }

    #[test]
    fn test_discover_sorts_ascending_by_version() {
        let temp_dir = TempDir::new().unwrap();
        write_pair(
            temp_dir.path(),
            "20240102000000",
            "add_col",
            "ALTER TABLE t ADD COLUMN c INTEGER;",
            "ALTER TABLE t DROP COLUMN c;",
        );
        write_pair(
            temp_dir.path(),
            "20240101000000",
            "init",
            "CREATE TABLE t (id INTEGER);",
            "DROP TABLE t;",
        );

        let store = MigrationStore::new(temp_dir.path());
        let migrations = store.discover().unwrap();
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].version, "20240101000000");
        assert_eq!(migrations[0].name, "init");
        assert!(migrations[0].up_sql.contains("CREATE TABLE t"));
        assert!(migrations[0].down_sql.as_ref().unwrap().contains("DROP TABLE t"));
        assert_eq!(migrations[1].version, "20240102000000");
        assert_eq!(migrations[1].name, "add_col");
    }

    #[test]
    fn test_up_only_migration_is_irreversible() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("20240101000000_init.up.sql"),
            "CREATE TABLE t (id INTEGER);",
        )
        .unwrap();

        let store = MigrationStore::new(temp_dir.path());
        let migrations = store.discover().unwrap();
        assert_eq!(migrations.len(), 1);
        assert!(!migrations[0].is_reversible());
        assert!(migrations[0].down_path.is_none());
    }

    #[test]
    fn test_down_only_migration_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("20240101000000_init.down.sql"),
            "DROP TABLE t;",
        )
        .unwrap();

        let store = MigrationStore::new(temp_dir.path());
        let err = store.discover().unwrap_err();
        assert!(matches!(err, MigrateError::Discovery(_)));
        assert!(err.to_string().contains("no up script"));
    }

    #[test]
    fn test_malformed_version_token_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("2024_init.up.sql"), "SELECT 1;").unwrap();

        let store = MigrationStore::new(temp_dir.path());
        let err = store.discover().unwrap_err();
        assert!(err.to_string().contains("Malformed version token"));
    }

    #[test]
    fn test_duplicate_version_across_names_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("20240101000000_init.up.sql"),
            "SELECT 1;",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("20240101000000_other.up.sql"),
            "SELECT 2;",
        )
        .unwrap();

        let store = MigrationStore::new(temp_dir.path());
        let err = store.discover().unwrap_err();
        assert!(err.to_string().contains("Duplicate version"));
    }

    #[test]
    fn test_stray_sql_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("seed_data.sql"), "SELECT 1;").unwrap();

        let store = MigrationStore::new(temp_dir.path());
        assert!(store.discover().is_err());
    }

    #[test]
    fn test_non_sql_files_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "notes").unwrap();
        write_pair(temp_dir.path(), "20240101000000", "init", "SELECT 1;", "SELECT 2;");

        let store = MigrationStore::new(temp_dir.path());
        assert_eq!(store.discover().unwrap().len(), 1);
    }

    #[test]
    fn test_name_may_contain_underscores() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("20240101000000_create_users_table.up.sql"),
            "SELECT 1;",
        )
        .unwrap();

        let store = MigrationStore::new(temp_dir.path());
        let migrations = store.discover().unwrap();
        assert_eq!(migrations[0].name, "create_users_table");
    }
}
