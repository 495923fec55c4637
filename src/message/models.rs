/*!
 * Message payload types.
 *
 * A catalog maps message ids to a translation and an optional translator
 * comment. Loose JSON payloads are checked here, before anything reaches
 * the database.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::database::schema::LOCALE_LENGTH;
use crate::errors::MessageStoreError;

/// One translated message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Translation in the catalog's locale
    pub message: String,
    /// Note for translators, absent when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Message {
    /// A message without comment
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            comment: None,
        }
    }

    /// A message carrying a translator comment
    pub fn with_comment(message: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            comment: Some(comment.into()),
        }
    }
}

/// Messages of one `(category, locale)` pair keyed by message id
pub type Catalog = BTreeMap<String, Message>;

/// Validate a JSON object of `id -> {"message": .., "comment": ..}` entries
pub fn parse_messages(payload: &Value) -> Result<Catalog, MessageStoreError> {
    let entries = payload.as_object().ok_or_else(|| {
        MessageStoreError::InvalidInput("Messages must be a JSON object keyed by message ID.".to_string())
    })?;

    let mut catalog = Catalog::new();
    for (message_id, data) in entries {
        catalog.insert(message_id.clone(), parse_message(message_id, data)?);
    }
    Ok(catalog)
}

fn parse_message(message_id: &str, data: &Value) -> Result<Message, MessageStoreError> {
    let fields = data.as_object().ok_or_else(|| {
        MessageStoreError::InvalidInput(format!("Message is not valid for ID \"{}\".", message_id))
    })?;

    let message = match fields.get("message") {
        None => {
            return Err(MessageStoreError::InvalidInput(format!(
                "Message is not valid for ID \"{}\". \"message\" key is missing.",
                message_id
            )));
        }
        Some(Value::String(message)) => message.clone(),
        Some(_) => {
            return Err(MessageStoreError::InvalidInput(format!(
                "Message is not a string for ID \"{}\".",
                message_id
            )));
        }
    };

    let comment = match fields.get("comment") {
        None | Some(Value::Null) => None,
        Some(Value::String(comment)) => Some(comment.clone()),
        Some(_) => {
            return Err(MessageStoreError::InvalidInput(format!(
                "Message comment is not a string for ID \"{}\".",
                message_id
            )));
        }
    };

    Ok(Message { message, comment })
}

/// Reject locales that cannot be stored in `message.locale`
pub fn validate_locale(locale: &str) -> Result<(), MessageStoreError> {
    if locale.is_empty() || locale.chars().count() > LOCALE_LENGTH {
        return Err(MessageStoreError::InvalidInput(format!(
            "Locale \"{}\" must be 1 to {} characters long.",
            locale, LOCALE_LENGTH
        )));
    }
    Ok(())
}

/// What a write changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// New rows in the source message table
    pub inserted_sources: usize,
    /// Translations written for the first time
    pub inserted: usize,
    /// Translations deleted and written again with a new value
    pub replaced: usize,
    /// Translations left untouched because the value did not change
    pub unchanged: usize,
}

impl WriteSummary {
    /// Whether the write issued any statement
    pub fn is_noop(&self) -> bool {
        self.inserted_sources == 0 && self.inserted == 0 && self.replaced == 0
    }
}

impl fmt::Display for WriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new source messages, {} inserted, {} replaced, {} unchanged",
            self.inserted_sources, self.inserted, self.replaced, self.unchanged
        )
    }
}
