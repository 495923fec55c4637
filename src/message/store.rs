/*!
 * Database-backed message store.
 *
 * Reads go through the process-local memo first, then the optional external
 * cache, then the database. Writes go straight to the database and leave
 * both caches untouched, so a store that already served a pair keeps
 * serving the old catalog until its memo is invalidated and the external
 * entry expires.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;

use super::cache::{cache_key, CatalogMemo, MessageCache, DEFAULT_CACHE_DURATION};
use super::models::{parse_messages, validate_locale, Catalog, Message, WriteSummary};
use crate::database::dialect::Dialect;
use crate::database::executor::{SqlExecutor, SqlValue};
use crate::database::models::TableNames;
use crate::errors::{MessageStoreError, Result};

/// Reads and writes message catalogs stored in the two catalog tables
pub struct MessageStore<E: SqlExecutor> {
    executor: E,
    dialect: Dialect,
    tables: TableNames,
    cache: Option<Arc<dyn MessageCache>>,
    cache_duration: Duration,
    cache_identity: String,
    memo: Arc<CatalogMemo>,
    transactional: bool,
}

impl<E: SqlExecutor> MessageStore<E> {
    /// Create a store without external cache, with a private memo and
    /// transactional writes
    pub fn new(executor: E, tables: TableNames) -> Result<Self> {
        let dialect = executor.dialect()?;
        let cache_identity = format!("message-db:{}:{}", tables.source_message, tables.message);

        Ok(Self {
            executor,
            dialect,
            tables,
            cache: None,
            cache_duration: DEFAULT_CACHE_DURATION,
            cache_identity,
            memo: Arc::new(CatalogMemo::new()),
            transactional: true,
        })
    }

    /// Put an external cache in front of database reads
    pub fn with_cache(mut self, cache: Arc<dyn MessageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Lifetime of external cache entries
    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    /// Identity mixed into external cache keys. Stores sharing a cache and
    /// an identity share entries.
    pub fn with_cache_identity(mut self, identity: impl Into<String>) -> Self {
        self.cache_identity = identity.into();
        self
    }

    /// Share a memo with other stores or with the caller
    pub fn with_memo(mut self, memo: Arc<CatalogMemo>) -> Self {
        self.memo = memo;
        self
    }

    /// Whether each write runs in its own transaction (default `true`).
    /// Without it a failing write leaves the entries before the failure applied.
    pub fn transactional_writes(mut self, enabled: bool) -> Self {
        self.transactional = enabled;
        self
    }

    /// Dialect of the underlying executor
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Resolved table names
    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// The process-local memo
    pub fn memo(&self) -> &Arc<CatalogMemo> {
        &self.memo
    }

    /// The underlying executor
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Translation of `id`, `None` when the catalog has no such message
    pub fn get_message(&self, id: &str, category: &str, locale: &str) -> Result<Option<String>> {
        Ok(self
            .get_messages(category, locale)?
            .remove(id)
            .map(|message| message.message))
    }

    /// Whole catalog of a pair, empty when nothing is stored.
    /// Memoized for the lifetime of the memo.
    pub fn get_messages(&self, category: &str, locale: &str) -> Result<Catalog> {
        if let Some(catalog) = self.memo.get(category, locale) {
            return Ok(catalog);
        }

        let catalog = self.read(category, locale)?;
        debug!(
            "Memoized {} messages for {}/{}",
            catalog.len(),
            category,
            locale
        );
        self.memo.insert(category, locale, catalog.clone());
        Ok(catalog)
    }

    /// Catalog of a pair through the external cache when one is configured
    pub fn read(&self, category: &str, locale: &str) -> Result<Catalog> {
        match &self.cache {
            Some(cache) => {
                let key = cache_key(&self.cache_identity, category, locale);
                cache.get_or_set(&key, self.cache_duration, &mut || {
                    self.read_from_db(category, locale)
                })
            }
            None => self.read_from_db(category, locale),
        }
    }

    /// Catalog of a pair straight from the database
    pub fn read_from_db(&self, category: &str, locale: &str) -> Result<Catalog> {
        let q = |identifier: &str| self.dialect.quote(identifier);
        let sql = format!(
            "SELECT t1.{}, t2.{}, t1.{} FROM {} t1 INNER JOIN {} t2 ON t1.{} = t2.{} \
             WHERE t1.{} = {} AND t2.{} = {}",
            q("message_id"),
            q("translation"),
            q("comment"),
            q(&self.tables.source_message),
            q(&self.tables.message),
            q("id"),
            q("id"),
            q("category"),
            self.dialect.placeholder(1),
            q("locale"),
            self.dialect.placeholder(2)
        );

        let rows = self
            .executor
            .query(&sql, &[category.into(), locale.into()])?;

        let mut catalog = Catalog::new();
        for row in rows {
            let Some(message_id) = row.get("message_id").and_then(SqlValue::as_text) else {
                continue;
            };
            let message = row
                .get("translation")
                .and_then(SqlValue::as_text)
                .unwrap_or_default();
            let comment = row
                .get("comment")
                .and_then(SqlValue::as_text)
                .filter(|comment| !comment.is_empty());

            catalog.insert(message_id, Message { message, comment });
        }

        Ok(catalog)
    }

    /// Validate a loose JSON payload and write it
    pub fn write_json(&self, category: &str, locale: &str, payload: &Value) -> Result<WriteSummary> {
        let messages = parse_messages(payload)?;
        self.write(category, locale, &messages)
    }

    /// Store `messages` for the pair.
    ///
    /// Missing source messages are created with their comment. Translations
    /// that changed are deleted and inserted again, new ones are inserted
    /// and unchanged ones are left alone. Neither cache is touched.
    pub fn write(&self, category: &str, locale: &str, messages: &Catalog) -> Result<WriteSummary> {
        validate_locale(locale)?;

        let transaction = if self.transactional {
            Some(WriteTransaction::begin(&self.executor)?)
        } else {
            None
        };

        let summary = self.write_messages(category, locale, messages)?;

        if let Some(transaction) = transaction {
            transaction.commit()?;
        }

        info!("Wrote {}/{}: {}", category, locale, summary);
        Ok(summary)
    }

    fn write_messages(&self, category: &str, locale: &str, messages: &Catalog) -> Result<WriteSummary> {
        let mut source_ids = self.source_ids(category)?;
        let existing = self.read_from_db(category, locale)?;
        let mut summary = WriteSummary::default();

        for (message_id, message) in messages {
            let id = match source_ids.get(message_id) {
                Some(id) => *id,
                None => {
                    let id = self.insert_source(category, message_id, message)?;
                    source_ids.insert(message_id.clone(), id);
                    summary.inserted_sources += 1;
                    id
                }
            };

            match existing.get(message_id) {
                Some(current) if current.message == message.message => {
                    summary.unchanged += 1;
                }
                Some(_) => {
                    self.delete_translation(id, locale)?;
                    self.insert_translation(id, locale, message_id, &message.message)?;
                    summary.replaced += 1;
                }
                None => {
                    self.insert_translation(id, locale, message_id, &message.message)?;
                    summary.inserted += 1;
                }
            }
        }

        Ok(summary)
    }

    /// `message_id -> id` of the category's source messages
    fn source_ids(&self, category: &str) -> Result<HashMap<String, i64>> {
        let q = |identifier: &str| self.dialect.quote(identifier);
        let sql = format!(
            "SELECT {}, {} FROM {} WHERE {} = {}",
            q("id"),
            q("message_id"),
            q(&self.tables.source_message),
            q("category"),
            self.dialect.placeholder(1)
        );

        let rows = self.executor.query(&sql, &[category.into()])?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get("id").and_then(SqlValue::as_i64)?;
                let message_id = row.get("message_id").and_then(SqlValue::as_text)?;
                Some((message_id, id))
            })
            .collect())
    }

    fn insert_source(&self, category: &str, message_id: &str, message: &Message) -> Result<i64> {
        let comment = message.comment.clone().unwrap_or_default();
        let id = self.executor.insert(
            &self.tables.source_message,
            &[
                ("category", category.into()),
                ("message_id", message_id.into()),
                ("comment", comment.into()),
            ],
        )?;

        id.ok_or_else(|| {
            MessageStoreError::Write(format!(
                "Failed to write source message with \"{}\" ID.",
                message_id
            ))
        })
    }

    fn insert_translation(&self, id: i64, locale: &str, message_id: &str, translation: &str) -> Result<()> {
        let inserted = self.executor.insert(
            &self.tables.message,
            &[
                ("id", id.into()),
                ("locale", locale.into()),
                ("translation", translation.into()),
            ],
        )?;

        if inserted.is_none() {
            return Err(MessageStoreError::Write(format!(
                "Failed to write message with \"{}\" ID.",
                message_id
            )));
        }
        Ok(())
    }

    fn delete_translation(&self, id: i64, locale: &str) -> Result<()> {
        let q = |identifier: &str| self.dialect.quote(identifier);
        let sql = format!(
            "DELETE FROM {} WHERE {} = {} AND {} = {}",
            q(&self.tables.message),
            q("id"),
            self.dialect.placeholder(1),
            q("locale"),
            self.dialect.placeholder(2)
        );

        self.executor.execute(&sql, &[id.into(), locale.into()])?;
        Ok(())
    }
}

/// Rolls back on drop unless committed
struct WriteTransaction<'a, E: SqlExecutor> {
    executor: &'a E,
    finished: bool,
}

impl<'a, E: SqlExecutor> WriteTransaction<'a, E> {
    fn begin(executor: &'a E) -> Result<Self> {
        executor.begin()?;
        Ok(Self {
            executor,
            finished: false,
        })
    }

    /// A failed COMMIT leaves the guard unfinished, so drop rolls back
    fn commit(mut self) -> Result<()> {
        self.executor.commit()?;
        self.finished = true;
        Ok(())
    }
}

impl<E: SqlExecutor> Drop for WriteTransaction<'_, E> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        debug!("Rolling back unfinished write");
        if let Err(e) = self.executor.rollback() {
            warn!("Failed to roll back write: {}", e);
        }
    }
}
