/*!
 * Integration tests for on-disk databases and async access
 */

use anyhow::Result;

use message_db::{DatabaseConnection, MessageStore, SchemaManager, TableNames};

use crate::common::{self, catalog};

/// Catalogs persist across connections to the same file
#[test]
fn test_fileDatabase_reopened_shouldKeepCatalog() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("messages.db");
    let tables = TableNames::default();

    {
        let db = DatabaseConnection::new(&path)?;
        SchemaManager::new(&db)?.ensure_schema(&tables)?;
        MessageStore::new(&db, tables.clone())?.write("app", "de", &catalog(&[("a", "A")]))?;
    }

    let db = DatabaseConnection::new(&path)?;
    let store = MessageStore::new(&db, tables.clone())?;
    assert_eq!(store.get_message("a", "app", "de")?.as_deref(), Some("A"));

    let stats = db.stats(&tables)?;
    assert_eq!(stats.source_messages, 1);
    assert_eq!(stats.categories, 1);
    assert!(stats.file_size_bytes > 0);
    Ok(())
}

/// Ensure, drop and ensure again on a file database
#[test]
fn test_fileDatabase_schemaLifecycle_shouldBeRepeatable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db = DatabaseConnection::new(temp_dir.path().join("messages.db"))?;
    let tables = TableNames::default();
    let manager = SchemaManager::new(&db)?;

    for _ in 0..2 {
        manager.ensure_schema(&tables)?;
        assert!(manager.has_schema(&tables)?);
        manager.drop_schema(&tables)?;
        assert!(!manager.has_schema(&tables)?);
    }
    Ok(())
}

/// Store calls run on the blocking pool from async code
#[tokio::test]
async fn test_store_onBlockingPool_shouldServeAsyncCallers() -> Result<()> {
    let db = common::sqlite_with_schema()?;
    let store_db = db.clone();

    let summary = tokio::task::spawn_blocking(move || {
        MessageStore::new(store_db, TableNames::default())?.write("app", "de", &catalog(&[("a", "A"), ("b", "B")]))
    })
    .await??;
    assert_eq!(summary.inserted, 2);

    let count = db
        .with_connection_async(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM `message`", [], |row| row.get(0))?;
            Ok(count)
        })
        .await?;
    assert_eq!(count, 2);
    Ok(())
}

/// Schema-qualified table names build a complete schema on SQLite
#[test]
fn test_ensureSchema_withMainQualifiedNames_shouldCreateIndexes() -> Result<()> {
    common::init_logging();
    let db = DatabaseConnection::new_in_memory()?;
    let tables = TableNames::new("main.source_message", "main.message", "")?;
    let manager = SchemaManager::new(&db)?;

    manager.ensure_schema(&tables)?;

    assert!(manager.has_schema(&tables)?);
    let indexes: Vec<String> = db.with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'IDX_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    })?;
    assert_eq!(indexes, vec!["IDX_message_locale", "IDX_source_message_category"]);

    let store = MessageStore::new(&db, tables.clone())?;
    store.write("app", "de", &catalog(&[("a", "A")]))?;
    assert_eq!(store.read_from_db("app", "de")?, catalog(&[("a", "A")]));
    Ok(())
}
