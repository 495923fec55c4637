/*!
 * Database module for the message catalog tables.
 *
 * This module provides:
 * - The `SqlExecutor` surface the rest of the crate talks to
 * - Per-dialect DDL profiles and the schema lifecycle built on them
 * - A SQLite-backed executor for embedded use and the CLI
 */

pub mod connection;
pub mod dialect;
pub mod executor;
pub mod models;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use dialect::{Dialect, DialectProfile};
pub use executor::{Row, SqlExecutor, SqlValue};
pub use models::{CatalogStats, TableNames};
pub use schema::SchemaManager;
