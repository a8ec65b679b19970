//! Durable storage for the conversation log
//!
//! The history store only needs to read and write a whole log at once.
//! A JSON file is the default; an in-memory backend serves tests and
//! sessions that do not need durability.

use crate::error::ChatError;
use crate::memory::ConversationLog;
use crate::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Trait for log persistence
pub trait LogStorage: Send + Sync {
    /// Read the stored log. `Ok(None)` means nothing has been stored yet.
    fn read(&self) -> Result<Option<ConversationLog>>;

    /// Replace the stored log with `log`
    fn write(&self, log: &ConversationLog) -> Result<()>;

    /// Human-readable location, used in log output
    fn describe(&self) -> String;
}

/// Pretty-printed JSON array on disk, rewritten in full on every save
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let mut name = self
            .path
            .file_name()
            .ok_or_else(|| {
                ChatError::StorageError(format!(
                    "History path has no file name: {}",
                    self.path.display()
                ))
            })?
            .to_os_string();
        name.push(".tmp");
        Ok(self.path.with_file_name(name))
    }
}

impl LogStorage for JsonFileStorage {
    fn read(&self) -> Result<Option<ConversationLog>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ChatError::StorageError(format!("Failed to read history file: {}", e))
        })?;

        if contents.trim().is_empty() {
            warn!(
                "History file {} is empty, treating it as no history",
                self.path.display()
            );
            return Ok(Some(ConversationLog::new()));
        }

        let log = serde_json::from_str(&contents).map_err(|e| {
            ChatError::StorageError(format!("Failed to parse history file: {}", e))
        })?;

        Ok(Some(log))
    }

    fn write(&self, log: &ConversationLog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ChatError::StorageError(format!(
                        "Failed to create history directory: {}",
                        e
                    ))
                })?;
            }
        }

        let contents = serde_json::to_string_pretty(log)?;

        let tmp_path = self.temp_path()?;
        fs::write(&tmp_path, contents).map_err(|e| {
            ChatError::StorageError(format!("Failed to write temporary history file: {}", e))
        })?;

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(ChatError::StorageError(format!(
                "Failed to rename history file: {}",
                e
            )));
        }

        debug!("Wrote {} messages to {}", log.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory log storage
pub struct InMemoryStorage {
    log: RwLock<Option<ConversationLog>>,
    fail_writes: bool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            log: RwLock::new(None),
            fail_writes: false,
        }
    }

    /// Start with `log` already stored
    pub fn with_log(log: ConversationLog) -> Self {
        Self {
            log: RwLock::new(Some(log)),
            fail_writes: false,
        }
    }

    /// Storage that rejects every write
    pub fn failing() -> Self {
        Self {
            log: RwLock::new(None),
            fail_writes: true,
        }
    }

    /// Copy of whatever was last written
    pub fn snapshot(&self) -> Option<ConversationLog> {
        self.log.read().ok().and_then(|log| log.clone())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStorage for InMemoryStorage {
    fn read(&self) -> Result<Option<ConversationLog>> {
        let log = self
            .log
            .read()
            .map_err(|_| ChatError::StorageError("In-memory storage lock poisoned".to_string()))?;
        Ok(log.clone())
    }

    fn write(&self, log: &ConversationLog) -> Result<()> {
        if self.fail_writes {
            return Err(ChatError::StorageError(
                "In-memory storage is read-only".to_string(),
            ));
        }

        let mut stored = self
            .log
            .write()
            .map_err(|_| ChatError::StorageError("In-memory storage lock poisoned".to_string()))?;
        *stored = Some(log.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory storage".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Message, MessageRole};
    use tempfile::tempdir;

    fn sample_log() -> ConversationLog {
        ConversationLog::from(vec![
            Message::new(MessageRole::User, "hi"),
            Message::new(MessageRole::Assistant, "hello"),
        ])
    }

    #[test]
    fn test_absent_file_reads_none() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("missing.json"));

        assert!(storage.read().unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("dtb.json"));
        let log = sample_log();

        storage.write(&log).unwrap();

        assert_eq!(storage.read().unwrap(), Some(log));
        assert!(!dir.path().join("dtb.json.tmp").exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("dtb.json");
        let storage = JsonFileStorage::new(&path);

        storage.write(&sample_log()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dtb.json");
        fs::write(&path, "[{\"role\": \"user\"}]").unwrap();

        let err = JsonFileStorage::new(&path).read().unwrap_err();
        assert!(matches!(err, ChatError::StorageError(_)));
    }

    #[test]
    fn test_empty_file_reads_as_empty_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dtb.json");
        fs::write(&path, "\n").unwrap();

        let log = JsonFileStorage::new(&path).read().unwrap().unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_write_fails_when_parent_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let storage = JsonFileStorage::new(blocker.join("dtb.json"));
        assert!(storage.write(&sample_log()).is_err());
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dtb.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupant"), "keeps the directory non-empty").unwrap();

        let err = JsonFileStorage::new(&path).write(&sample_log()).unwrap_err();

        assert!(err.to_string().contains("rename"));
        assert!(!dir.path().join("dtb.json.tmp").exists());
    }

    #[test]
    fn test_in_memory_storage() {
        let storage = InMemoryStorage::new();
        assert!(storage.read().unwrap().is_none());

        storage.write(&sample_log()).unwrap();
        assert_eq!(storage.snapshot().map(|l| l.len()), Some(2));

        let failing = InMemoryStorage::failing();
        assert!(failing.write(&sample_log()).is_err());
        assert!(failing.snapshot().is_none());
    }
}
