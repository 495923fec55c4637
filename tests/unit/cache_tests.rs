/*!
 * Tests for the message cache and the catalog memo
 */

use std::sync::Arc;
use std::time::Duration;

use message_db::message::cache_key;
use message_db::{CatalogMemo, MemoryCache, MessageCache};

use crate::common::catalog;

/// Cache keys depend on every part of the identity triple
#[test]
fn test_cacheKey_withDifferentIdentity_shouldDiffer() {
    let key = cache_key("message-db:source_message:message", "app", "de");

    assert_ne!(key, cache_key("message-db:yii_source_message:yii_message", "app", "de"));
    assert_ne!(key, cache_key("message-db:source_message:message", "web", "de"));
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
}

/// Clones of a memory cache share their entries
#[test]
fn test_memoryCache_clone_shouldShareEntries() {
    let cache = MemoryCache::new();
    let clone = cache.clone();

    clone.set("k", catalog(&[("a", "A")]), Duration::from_secs(60));

    assert_eq!(cache.get("k"), Some(catalog(&[("a", "A")])));
    cache.clear();
    assert!(clone.is_empty());
}

/// The cache is usable as a trait object across threads
#[test]
fn test_memoryCache_asSharedTraitObject_shouldWorkAcrossThreads() {
    let cache: Arc<dyn MessageCache> = Arc::new(MemoryCache::new());

    let writer = {
        let cache = cache.clone();
        std::thread::spawn(move || cache.set("k", catalog(&[("a", "A")]), Duration::from_secs(60)))
    };
    writer.join().unwrap();

    assert_eq!(cache.get("k"), Some(catalog(&[("a", "A")])));
}

/// A shared memo serves every holder
#[test]
fn test_catalogMemo_shared_shouldServeAllHolders() {
    let memo = Arc::new(CatalogMemo::new());
    let other = memo.clone();

    memo.insert("app", "de", catalog(&[("a", "A")]));

    assert_eq!(other.get("app", "de"), Some(catalog(&[("a", "A")])));
    assert_eq!(other.len(), 1);
    assert!(other.get("app", "fr").is_none());
}
