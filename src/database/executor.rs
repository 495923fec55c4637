/*!
 * The SQL execution surface consumed by the schema manager and the store.
 *
 * Implementations own the connection. The library only issues statements
 * through this trait and never opens or closes anything itself.
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use super::dialect::Dialect;
use crate::errors::MessageStoreError;

/// A bound parameter or a fetched column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Any integer column
    Integer(i64),
    /// Any character column
    Text(String),
}

impl SqlValue {
    /// Integer content, also accepting numeric text (Oracle and SQL Server
    /// drivers often hand back `NUMBER` columns as strings)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Null => None,
        }
    }

    /// Text content, `None` for NULL
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Null => None,
        }
    }

    /// Whether the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A fetched row, keyed by lower-cased column name
pub type Row = HashMap<String, SqlValue>;

/// Database access needed by the schema manager and the message store
pub trait SqlExecutor {
    /// Driver name, e.g. `mysql`, `pgsql`, `sqlsrv`, `oci` or `sqlite`
    fn driver_name(&self) -> &str;

    /// Run a DDL or DML statement, returning the number of affected rows
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize>;

    /// Run a query and return every row
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Insert one row into the raw table name `table` and return its `id`:
    /// the generated key, or the supplied one when `id` is among `values`.
    /// `None` means the driver reported no inserted row.
    fn insert(&self, table: &str, values: &[(&str, SqlValue)]) -> Result<Option<i64>>;

    /// Whether the table exists. Must bypass any schema cache.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Names of the foreign keys declared on the table
    fn foreign_keys(&self, table: &str) -> Result<Vec<String>>;

    /// Start a transaction
    fn begin(&self) -> Result<()>;

    /// Commit the current transaction
    fn commit(&self) -> Result<()>;

    /// Roll back the current transaction
    fn rollback(&self) -> Result<()>;

    /// Dialect of this executor
    fn dialect(&self) -> Result<Dialect, MessageStoreError> {
        Dialect::from_driver_name(self.driver_name())
    }
}

impl<E: SqlExecutor + ?Sized> SqlExecutor for &E {
    fn driver_name(&self) -> &str {
        (**self).driver_name()
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        (**self).execute(sql, params)
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn insert(&self, table: &str, values: &[(&str, SqlValue)]) -> Result<Option<i64>> {
        (**self).insert(table, values)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        (**self).table_exists(table)
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<String>> {
        (**self).foreign_keys(table)
    }

    fn begin(&self) -> Result<()> {
        (**self).begin()
    }

    fn commit(&self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<()> {
        (**self).rollback()
    }
}

impl<E: SqlExecutor + ?Sized> SqlExecutor for Arc<E> {
    fn driver_name(&self) -> &str {
        (**self).driver_name()
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        (**self).execute(sql, params)
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn insert(&self, table: &str, values: &[(&str, SqlValue)]) -> Result<Option<i64>> {
        (**self).insert(table, values)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        (**self).table_exists(table)
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<String>> {
        (**self).foreign_keys(table)
    }

    fn begin(&self) -> Result<()> {
        (**self).begin()
    }

    fn commit(&self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<()> {
        (**self).rollback()
    }
}
