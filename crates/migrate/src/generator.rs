//! Migration authoring
//!
//! Creates the skeleton file pair for a new migration with a fresh,
//! monotonically increasing version. Independent of the database; invoked
//! only when authoring.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};

use crate::error::{MigrateError, MigrateResult};
use crate::store::{DOWN_SUFFIX, UP_SUFFIX, VERSION_LEN};

/// Creates new migration definitions on disk
pub struct Generator {
    migrations_dir: PathBuf,
}

impl Generator {
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Write the up/down skeleton pair for `name` and return both paths
    pub fn create(&self, name: &str) -> MigrateResult<(PathBuf, PathBuf)> {
        fs::create_dir_all(&self.migrations_dir)?;

        let name = sanitize_name(name)?;
        let existing = self.existing_versions()?;
        let version = next_version(&existing, Utc::now());

        let up_path = self
            .migrations_dir
            .join(format!("{}_{}{}", version, name, UP_SUFFIX));
        let down_path = self
            .migrations_dir
            .join(format!("{}_{}{}", version, name, DOWN_SUFFIX));
        if up_path.exists() || down_path.exists() {
            return Err(MigrateError::NameConflict(format!("{}_{}", version, name)));
        }

        let created = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        fs::write(
            &up_path,
            format!(
                "-- Migration: {} ({})\n-- Created: {}\n\n-- Add your schema changes here\n\n",
                name, version, created
            ),
        )?;
        fs::write(
            &down_path,
            format!(
                "-- Migration: {} ({})\n-- Created: {}\n\n-- Add rollback statements here\n\n",
                name, version, created
            ),
        )?;

        Ok((up_path, down_path))
    }

    /// Version tokens already present in the migrations directory
    ///
    /// Lenient on purpose: a malformed neighbor should not block authoring,
    /// it gets reported by discovery at migrate time.
    fn existing_versions(&self) -> MigrateResult<BTreeSet<String>> {
        let mut versions = BTreeSet::new();
        for entry in fs::read_dir(&self.migrations_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !file_name.ends_with(".sql") {
                continue;
            }
            let bytes = file_name.as_bytes();
            if bytes.len() >= VERSION_LEN && bytes[..VERSION_LEN].iter().all(u8::is_ascii_digit) {
                versions.insert(file_name[..VERSION_LEN].to_string());
            }
        }
        Ok(versions)
    }
}

/// Render a timestamp as a version token, advancing past taken versions
///
/// Rapid successive calls land on the same second; advancing one second at a
/// time keeps the result deterministic and strictly increasing.
fn next_version(existing: &BTreeSet<String>, now: DateTime<Utc>) -> String {
    let mut candidate = now;
    loop {
        let token = candidate.format("%Y%m%d%H%M%S").to_string();
        if !existing.contains(&token) {
            return token;
        }
        candidate += Duration::seconds(1);
    }
}

/// Reduce a human-supplied name to a filesystem-safe token
fn sanitize_name(name: &str) -> MigrateResult<String> {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            sanitized.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !sanitized.ends_with('_') {
            sanitized.push('_');
        }
    }
    let sanitized = sanitized.trim_matches('_').to_string();
    if sanitized.is_empty() {
        return Err(MigrateError::Configuration(format!(
            "Migration name '{}' has no usable characters",
            name
        )));
    }
    Ok(sanitized)
}
