/*!
 * Integration tests for cached reads across stores
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use message_db::{CatalogMemo, MemoryCache, MessageStore, TableNames};

use crate::common::{self, catalog, RecordingExecutor};

/// A cached catalog outlives writes until it expires
#[test]
fn test_read_withSharedCache_shouldServeStaleCatalogAfterWrite() -> Result<()> {
    let db = common::sqlite_with_schema()?;
    let cache = Arc::new(MemoryCache::new());
    let writer = MessageStore::new(db.clone(), TableNames::default())?;
    writer.write("app", "de", &catalog(&[("greet", "Hallo")]))?;

    let reader = MessageStore::new(db.clone(), TableNames::default())?.with_cache(cache.clone());
    assert_eq!(reader.get_message("greet", "app", "de")?.as_deref(), Some("Hallo"));

    writer.write("app", "de", &catalog(&[("greet", "Servus")]))?;

    // A new store starts with an empty memo but hits the shared cache
    let second = MessageStore::new(db.clone(), TableNames::default())?.with_cache(cache.clone());
    assert_eq!(second.get_message("greet", "app", "de")?.as_deref(), Some("Hallo"));

    // Without the cache the database answers
    let uncached = MessageStore::new(db, TableNames::default())?;
    assert_eq!(uncached.get_message("greet", "app", "de")?.as_deref(), Some("Servus"));
    Ok(())
}

/// Expired entries are read again from the database
#[test]
fn test_read_withZeroDuration_shouldAlwaysHitDatabase() -> Result<()> {
    let db = common::sqlite_with_schema()?;
    let recorder = RecordingExecutor::over(db);
    let store = MessageStore::new(recorder.clone(), TableNames::default())?
        .with_cache(Arc::new(MemoryCache::new()))
        .with_cache_duration(Duration::ZERO);

    store.read("app", "de")?;
    store.read("app", "de")?;

    assert_eq!(recorder.count("SELECT"), 2);
    Ok(())
}

/// Fresh entries spare the database
#[test]
fn test_read_withCache_shouldQueryOnce() -> Result<()> {
    let db = common::sqlite_with_schema()?;
    let recorder = RecordingExecutor::over(db);
    let cache = Arc::new(MemoryCache::new());
    let store = MessageStore::new(recorder.clone(), TableNames::default())?.with_cache(cache.clone());

    store.read("app", "de")?;
    store.read("app", "de")?;
    store.read("app", "fr")?;

    assert_eq!(recorder.count("SELECT"), 2);
    let (hits, misses, _) = cache.stats();
    assert_eq!((hits, misses), (1, 2));
    Ok(())
}

/// Stores over different tables never share cache entries by default
#[test]
fn test_cacheIdentity_withDifferentTables_shouldSeparateEntries() -> Result<()> {
    let db = common::sqlite_with_schema()?;
    let prefixed = TableNames::with_prefix("yii_")?;
    message_db::SchemaManager::new(&db)?.ensure_schema(&prefixed)?;
    let cache = Arc::new(MemoryCache::new());

    let plain = MessageStore::new(db.clone(), TableNames::default())?.with_cache(cache.clone());
    let other = MessageStore::new(db, prefixed)?.with_cache(cache.clone());
    plain.write("app", "de", &catalog(&[("a", "plain")]))?;
    other.write("app", "de", &catalog(&[("a", "prefixed")]))?;

    assert_eq!(plain.get_message("a", "app", "de")?.as_deref(), Some("plain"));
    assert_eq!(other.get_message("a", "app", "de")?.as_deref(), Some("prefixed"));
    assert_eq!(cache.len(), 2);
    Ok(())
}

/// An explicit identity lets stores share entries
#[test]
fn test_cacheIdentity_whenShared_shouldReuseEntries() -> Result<()> {
    let db = common::sqlite_with_schema()?;
    let recorder = RecordingExecutor::over(db);
    let cache = Arc::new(MemoryCache::new());
    recorder.clear();

    for _ in 0..2 {
        let store = MessageStore::new(recorder.clone(), TableNames::default())?
            .with_cache(cache.clone())
            .with_cache_identity("shared");
        store.get_messages("app", "de")?;
    }

    assert_eq!(recorder.count("SELECT"), 1);
    Ok(())
}

/// Memo invalidation forces one pair back to the database
#[test]
fn test_sharedMemo_invalidate_shouldRefreshOnlyThatPair() -> Result<()> {
    let db = common::sqlite_with_schema()?;
    let memo = Arc::new(CatalogMemo::new());
    let store = MessageStore::new(db.clone(), TableNames::default())?.with_memo(memo.clone());
    store.write("app", "de", &catalog(&[("a", "A")]))?;
    store.write("app", "fr", &catalog(&[("a", "A-fr")]))?;
    store.get_messages("app", "de")?;
    store.get_messages("app", "fr")?;

    store.write("app", "de", &catalog(&[("a", "A2")]))?;
    store.write("app", "fr", &catalog(&[("a", "A2-fr")]))?;
    memo.invalidate("app", "de");

    let other = MessageStore::new(db, TableNames::default())?.with_memo(memo.clone());
    assert_eq!(other.get_message("a", "app", "de")?.as_deref(), Some("A2"));
    assert_eq!(other.get_message("a", "app", "fr")?.as_deref(), Some("A-fr"));

    memo.clear();
    assert_eq!(store.get_message("a", "app", "fr")?.as_deref(), Some("A2-fr"));
    Ok(())
}
