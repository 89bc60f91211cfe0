//! Identifier safety for interpolated SQL
//!
//! Values always go through bind parameters; schema and table names cannot,
//! so they are validated up front and escaped at every interpolation site.

use crate::error::{MigrateError, MigrateResult};

/// Characters allowed in SQL identifiers (alphanumeric, underscore, dollar)
const ALLOWED_IDENTIFIER_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// SQL keywords rejected as schema or table names
static SQL_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "UNION",
    "DROP", "CREATE", "ALTER", "GRANT", "REVOKE", "TRUNCATE", "TABLE", "USER",
];

/// Escape a SQL identifier (schema name, table name)
///
/// Escapes any existing double quotes by doubling them, then wraps the
/// identifier in double quotes for safe SQL usage.
///
/// # Examples
/// ```
/// use strata_migrate::security::escape_identifier;
///
/// assert_eq!(escape_identifier("app_schema"), "\"app_schema\"");
/// assert_eq!(escape_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn escape_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Validate that an identifier is safe to configure as a schema or table name
pub fn validate_identifier(identifier: &str) -> MigrateResult<()> {
    if identifier.is_empty() {
        return Err(MigrateError::Configuration(
            "Identifier cannot be empty".to_string(),
        ));
    }

    // PostgreSQL identifier limit is 63 characters
    if identifier.len() > 63 {
        return Err(MigrateError::Configuration(format!(
            "Identifier '{}' is too long (max 63 characters)",
            identifier
        )));
    }

    for c in identifier.chars() {
        if !ALLOWED_IDENTIFIER_CHARS.contains(c) {
            return Err(MigrateError::Configuration(format!(
                "Identifier '{}' contains invalid character '{}'",
                identifier, c
            )));
        }
    }

    if identifier.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(MigrateError::Configuration(format!(
            "Identifier '{}' cannot start with a number",
            identifier
        )));
    }

    let upper_identifier = identifier.to_uppercase();
    if SQL_KEYWORDS.contains(&upper_identifier.as_str()) {
        return Err(MigrateError::Configuration(format!(
            "Identifier '{}' is a reserved SQL keyword",
            identifier
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("app_schema"), "\"app_schema\"");
        assert_eq!(escape_identifier("odd\"name"), "\"odd\"\"name\"");
        assert_eq!(escape_identifier("simple"), "\"simple\"");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("app_schema").is_ok());
        assert!(validate_identifier("ledger1").is_ok());
        assert!(validate_identifier("_private").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1schema").is_err());
        assert!(validate_identifier("schema-name").is_err());
        assert!(validate_identifier("schema name").is_err());
        assert!(validate_identifier("SELECT").is_err());
        assert!(validate_identifier("select").is_err());
        assert!(validate_identifier(&"x".repeat(64)).is_err());
    }
}
