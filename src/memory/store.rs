//! Conversation history storage
//!
//! Owns the ordered log of chat turns, loads it once from durable storage
//! and rewrites the whole log after every mutation.

use crate::storage::{JsonFileStorage, LogStorage};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Capitalized label used when rendering prompts
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Accepts RFC 3339 timestamps as well as offset-less ISO-8601 ones
/// (older logs), which are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Ordered sequence of messages, oldest first.
///
/// Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over all messages in insertion order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// The last `count` messages, oldest of the window first
    pub fn recent(&self, count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Keep messages matching `keep`, returning how many were dropped
    pub(crate) fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Message) -> bool,
    {
        let before = self.messages.len();
        self.messages.retain(keep);
        before - self.messages.len()
    }

    /// Remove everything, returning how many were dropped
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.messages.len();
        self.messages.clear();
        removed
    }
}

impl From<Vec<Message>> for ConversationLog {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Durable, ordered record of every conversation turn.
///
/// The in-memory log is authoritative for the session. Persistence
/// failures are logged and never roll back an in-memory change; the next
/// successful write brings storage back in line.
pub struct HistoryStore {
    storage: Box<dyn LogStorage>,
    log: ConversationLog,
}

impl HistoryStore {
    /// Open a JSON-file backed store and load whatever it holds
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_storage(Box::new(JsonFileStorage::new(path)))
    }

    pub fn with_storage(storage: Box<dyn LogStorage>) -> Self {
        let mut store = Self {
            storage,
            log: ConversationLog::new(),
        };
        store.log = store.load();
        store
    }

    /// Read the log from storage.
    ///
    /// Absent storage yields an empty log. Unreadable or malformed storage
    /// also yields an empty log, with a warning; the bad data is
    /// overwritten on the next save.
    pub fn load(&self) -> ConversationLog {
        match self.storage.read() {
            Ok(Some(log)) => {
                info!(
                    "Loaded {} messages from {}",
                    log.len(),
                    self.storage.describe()
                );
                log
            }
            Ok(None) => {
                info!(
                    "No conversation history at {}, starting empty",
                    self.storage.describe()
                );
                ConversationLog::new()
            }
            Err(e) => {
                warn!(
                    "Error loading history from {}: {}. Starting with empty history",
                    self.storage.describe(),
                    e
                );
                ConversationLog::new()
            }
        }
    }

    /// Append a message stamped with the current time and persist the log
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> Message {
        let now = Utc::now();
        // Wall clock may step backwards; the log must not.
        let timestamp = match self.log.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let message = Message {
            role,
            content: content.into(),
            timestamp,
        };

        self.log.push(message.clone());
        debug!("Appended {} message ({} total)", role, self.log.len());
        self.persist();

        message
    }

    /// Clear the whole log. Returns the number of messages removed.
    pub fn delete_all(&mut self) -> usize {
        let removed = self.log.clear();
        self.persist();
        info!("All conversation history deleted ({} messages)", removed);
        removed
    }

    /// Remove every message whose content contains `keyword`, ignoring case.
    ///
    /// An empty or whitespace-only keyword matches every message, so this
    /// clears the log. Callers that do not want that must check first.
    pub fn delete_matching(&mut self, keyword: &str) -> usize {
        let removed = if keyword.trim().is_empty() {
            self.log.clear()
        } else {
            let needle = keyword.to_lowercase();
            self.log
                .retain(|msg| !msg.content.to_lowercase().contains(&needle))
        };
        self.persist();
        info!(
            "Deleted {} messages containing '{}' ({} remain)",
            removed,
            keyword,
            self.log.len()
        );
        removed
    }

    /// Current in-memory log
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.log.messages()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn storage_description(&self) -> String {
        self.storage.describe()
    }

    fn persist(&self) {
        if let Err(e) = self.storage.write(&self.log) {
            warn!(
                "Error saving history to {}: {}",
                self.storage.describe(),
                e
            );
        }
    }
}
