/*!
 * Translation messages: payload types, caching and the database-backed store.
 */

pub mod cache;
pub mod models;
pub mod store;

pub use cache::{cache_key, CatalogMemo, MemoryCache, MessageCache, DEFAULT_CACHE_DURATION};
pub use models::{parse_messages, Catalog, Message, WriteSummary};
pub use store::MessageStore;
