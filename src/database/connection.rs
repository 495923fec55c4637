/*!
 * SQLite database connection.
 *
 * This module handles SQLite connection creation and implements the
 * `SqlExecutor` surface on top of it, so the schema manager and the
 * message store can run against an embedded database.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::dialect::Dialect;
use super::executor::{Row, SqlExecutor, SqlValue};
use super::models::{CatalogStats, TableNames};

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "messages.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "message-db";

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Create a new database connection at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Create a new database connection at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        // Cascading deletes depend on it
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        // Try to use the system data directory
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run a closure with the locked connection
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

        f(&conn)
    }

    /// Run a closure with the locked connection on the blocking pool
    pub async fn with_connection_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

            f(&conn)
        })
        .await
        .context("Database task panicked")?
    }

    /// Row counts for the catalog stored under `tables`
    pub fn stats(&self, tables: &TableNames) -> Result<CatalogStats> {
        let source = Dialect::Sqlite.quote(&tables.source_message);
        let message = Dialect::Sqlite.quote(&tables.message);

        self.with_connection(|conn| {
            let count = |sql: String| -> Result<i64> {
                conn.query_row(&sql, [], |row| row.get(0))
                    .with_context(|| format!("Failed to run: {}", sql))
            };

            let source_messages = count(format!("SELECT COUNT(*) FROM {}", source))?;
            let translations = count(format!("SELECT COUNT(*) FROM {}", message))?;
            let categories = count(format!("SELECT COUNT(DISTINCT `category`) FROM {}", source))?;
            let locales = count(format!("SELECT COUNT(DISTINCT `locale`) FROM {}", message))?;

            // Get file size if not in-memory
            let file_size_bytes = if self.db_path.to_string_lossy() != ":memory:" {
                std::fs::metadata(&self.db_path)
                    .map(|m| m.len())
                    .unwrap_or(0)
            } else {
                0
            };

            Ok(CatalogStats {
                source_messages,
                translations,
                categories,
                locales,
                file_size_bytes,
            })
        })
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            SqlValue::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
        })
    }
}

fn to_sql_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Integer(v),
        ValueRef::Real(v) => SqlValue::Text(v.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            SqlValue::Text(String::from_utf8_lossy(t).into_owned())
        }
    }
}

impl SqlExecutor for DatabaseConnection {
    fn driver_name(&self) -> &str {
        Dialect::Sqlite.driver_name()
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        self.with_connection(|conn| {
            conn.execute(sql, params_from_iter(params.iter()))
                .with_context(|| format!("Failed to execute: {}", sql))
        })
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .with_context(|| format!("Failed to prepare: {}", sql))?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(|name| name.to_lowercase())
                .collect();

            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    let mut fetched = Row::with_capacity(columns.len());
                    for (index, column) in columns.iter().enumerate() {
                        fetched.insert(column.clone(), to_sql_value(row.get_ref(index)?));
                    }
                    Ok(fetched)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(rows)
        })
    }

    fn insert(&self, table: &str, values: &[(&str, SqlValue)]) -> Result<Option<i64>> {
        let dialect = Dialect::Sqlite;
        let columns: Vec<String> = values.iter().map(|(column, _)| dialect.quote(column)).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| dialect.placeholder(i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            dialect.quote(table),
            columns.join(", "),
            placeholders.join(", ")
        );

        self.with_connection(|conn| {
            let inserted = conn
                .execute(&sql, params_from_iter(values.iter().map(|(_, value)| value)))
                .with_context(|| format!("Failed to insert into {}", table))?;

            if inserted == 0 {
                return Ok(None);
            }

            let supplied = values
                .iter()
                .find(|(column, _)| *column == "id")
                .and_then(|(_, value)| value.as_i64());

            Ok(Some(supplied.unwrap_or_else(|| conn.last_insert_rowid())))
        })
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let name = TableNames::short_name(table).to_string();

        self.with_connection(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [&name],
                    |row| row.get(0),
                )
                .context("Failed to check table existence")?;
            Ok(count > 0)
        })
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<String>> {
        let name = TableNames::short_name(table).to_string();

        // SQLite keeps no constraint names, report the referenced tables
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT \"table\" FROM pragma_foreign_key_list(?1)")?;
            let tables = stmt
                .query_map([&name], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tables)
        })
    }

    fn begin(&self) -> Result<()> {
        self.with_connection(|conn| Ok(conn.execute_batch("BEGIN")?))
    }

    fn commit(&self) -> Result<()> {
        self.with_connection(|conn| Ok(conn.execute_batch("COMMIT")?))
    }

    fn rollback(&self) -> Result<()> {
        self.with_connection(|conn| Ok(conn.execute_batch("ROLLBACK")?))
    }
}
