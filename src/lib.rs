/*!
 * # message-db
 *
 * Relational storage for translation messages.
 *
 * Messages are stored in two tables: `source_message` holds one row per
 * `(category, message id)` and `message` holds one translation per locale.
 * Together they form catalogs of `message id -> {message, comment}` per
 * `(category, locale)` pair.
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `database`: the SQL execution surface and its SQLite implementation:
 *   - `database::dialect`: per-dialect DDL profiles (MySQL, PostgreSQL,
 *     SQL Server, Oracle, SQLite)
 *   - `database::schema`: creating and dropping the catalog tables
 * - `message`: the message store and its caches:
 *   - `message::store`: reading and writing catalogs
 *   - `message::cache`: the external cache trait and the process-local memo
 * - `app_config`: Configuration management
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod message;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{DatabaseConnection, Dialect, SchemaManager, SqlExecutor, SqlValue, TableNames};
pub use errors::{MessageStoreError, Result};
pub use message::{Catalog, CatalogMemo, MemoryCache, Message, MessageCache, MessageStore, WriteSummary};
