/*!
 * Common test utilities for the message-db test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::path::PathBuf;
use std::fs;
use tempfile::TempDir;

use message_db::{Catalog, DatabaseConnection, Message, MessageStore, SchemaManager, TableNames};


pub use recording_executor::RecordingExecutor;

/// Route library logs to the test output, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// In-memory SQLite database with the default catalog tables
pub fn sqlite_with_schema() -> Result<DatabaseConnection> {
    init_logging();
    let db = DatabaseConnection::new_in_memory()?;
    SchemaManager::new(&db)?.ensure_schema(&TableNames::default())?;
    Ok(db)
}

/// Store over an in-memory database with the default tables
pub fn sqlite_store() -> Result<MessageStore<DatabaseConnection>> {
    Ok(MessageStore::new(sqlite_with_schema()?, TableNames::default())?)
}

/// Store whose statements are recorded, over an in-memory database
pub fn recorded_store() -> Result<(RecordingExecutor, MessageStore<RecordingExecutor>)> {
    let recorder = RecordingExecutor::over(sqlite_with_schema()?);
    let store = MessageStore::new(recorder.clone(), TableNames::default())?;
    Ok((recorder, store))
}

/// Catalog of comment-less messages
pub fn catalog(entries: &[(&str, &str)]) -> Catalog {
    entries
        .iter()
        .map(|(id, message)| (id.to_string(), Message::new(*message)))
        .collect()
}
