/*!
 * Table naming and catalog statistics.
 *
 * Table names may be written in the `{{%name}}` notation, where the braces
 * mark a table reference and `%` stands for the configured table prefix.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::MessageStoreError;

/// Default name of the source message table
pub const DEFAULT_SOURCE_MESSAGE_TABLE: &str = "source_message";

/// Default name of the translation table
pub const DEFAULT_MESSAGE_TABLE: &str = "message";

/// Raw (resolved, unquoted) names of the two catalog tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    /// Table holding `id, category, message_id, comment`
    pub source_message: String,
    /// Table holding `id, locale, translation`
    pub message: String,
}

impl TableNames {
    /// Resolve both names against `prefix` and validate them
    pub fn new(source_message: &str, message: &str, prefix: &str) -> Result<Self, MessageStoreError> {
        let names = Self {
            source_message: resolve_table_name(source_message, prefix),
            message: resolve_table_name(message, prefix),
        };
        validate_identifier(&names.source_message)?;
        validate_identifier(&names.message)?;

        if names.source_message == names.message {
            return Err(MessageStoreError::InvalidInput(format!(
                "Source message and message tables must differ, both are `{}`",
                names.message
            )));
        }

        Ok(names)
    }

    /// Default names with a prefix, e.g. `yii_source_message`/`yii_message`
    pub fn with_prefix(prefix: &str) -> Result<Self, MessageStoreError> {
        Self::new("{{%source_message}}", "{{%message}}", prefix)
    }

    /// Last path segment of a possibly schema-qualified name, used to
    /// derive constraint, index, sequence and trigger names
    pub fn short_name(name: &str) -> &str {
        name.rsplit('.').next().unwrap_or(name)
    }

    /// `FK_<source>_<message>`, the foreign key name on ALTER-capable dialects
    pub fn foreign_key_name(&self) -> String {
        format!(
            "FK_{}_{}",
            Self::short_name(&self.source_message),
            Self::short_name(&self.message)
        )
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            source_message: DEFAULT_SOURCE_MESSAGE_TABLE.to_string(),
            message: DEFAULT_MESSAGE_TABLE.to_string(),
        }
    }
}

impl fmt::Display for TableNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_message, self.message)
    }
}

/// Turn `{{%name}}` into `<prefix>name`; plain names pass through
pub fn resolve_table_name(name: &str, prefix: &str) -> String {
    let trimmed = name.trim();
    match trimmed
        .strip_prefix("{{")
        .and_then(|inner| inner.strip_suffix("}}"))
    {
        Some(inner) => inner.replace('%', prefix),
        None => trimmed.to_string(),
    }
}

/// Identifiers are interpolated into DDL, so only `[A-Za-z0-9_]` segments
/// separated by dots are accepted
pub fn validate_identifier(identifier: &str) -> Result<(), MessageStoreError> {
    let valid = !identifier.is_empty()
        && identifier.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(MessageStoreError::InvalidInput(format!(
            "Invalid table name `{}`",
            identifier
        )))
    }
}

/// Row counts of a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Rows in the source message table
    pub source_messages: i64,
    /// Rows in the translation table
    pub translations: i64,
    /// Distinct categories
    pub categories: i64,
    /// Distinct locales
    pub locales: i64,
    /// Database file size in bytes (0 for in-memory databases)
    pub file_size_bytes: u64,
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Source messages: {}, Translations: {}, Categories: {}, Locales: {}, Size: {} KB",
            self.source_messages,
            self.translations,
            self.categories,
            self.locales,
            self.file_size_bytes / 1024
        )
    }
}
