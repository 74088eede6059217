//! # Client Storage
//!
//! A string key/value store standing in for the browser's `localStorage`,
//! plus the JSON records the transport keeps in it.
//!
//! - [`MemoryStorage`]: process-local, the default
//! - [`FileStorage`]: one JSON object on disk, rewritten on every change
//!
//! Writes are last-write-wins; there are no transactions.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable string key/value store
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// region: --- MemoryStorage

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// endregion: --- MemoryStorage

// region: --- FileStorage

/// Storage persisted as a single JSON object
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

// endregion: --- FileStorage

// region: --- Stored records

/// Storage keys derived from the configured prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub session: String,
    pub preferences: String,
    pub context: String,
}

impl StorageKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            session: format!("{}_session", prefix),
            preferences: format!("{}_user_preferences", prefix),
            context: format!("{}_conversation_context", prefix),
        }
    }
}

/// Visitor preferences; unknown keys are kept as flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_style: Option<String>,
    #[serde(flatten)]
    pub flags: Map<String, Value>,
}

impl UserPreferences {
    /// Overlay every field set in `patch`
    pub fn merge(&mut self, patch: UserPreferences) {
        if patch.theme.is_some() {
            self.theme = patch.theme;
        }
        if patch.language.is_some() {
            self.language = patch.language;
        }
        if patch.response_style.is_some() {
            self.response_style = patch.response_style;
        }
        self.flags.extend(patch.flags);
    }
}

/// What the conversation has covered so far
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationContext {
    #[serde(default)]
    pub topics_discussed: Vec<String>,
    #[serde(default)]
    pub user_interests: Vec<String>,
    #[serde(default)]
    pub last_interaction: Option<String>,
    #[serde(default = "initial_flow")]
    pub conversation_flow: String,
}

fn initial_flow() -> String {
    "initial".to_string()
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self {
            topics_discussed: Vec::new(),
            user_interests: Vec::new(),
            last_interaction: None,
            conversation_flow: initial_flow(),
        }
    }
}

impl ConversationContext {
    /// Fold a successful reply into the context.
    ///
    /// `metadata.intent` becomes a topic (once), a numeric
    /// `metadata.workflow_step` becomes `conversation_flow = "step_N"`.
    pub fn record(&mut self, metadata: Option<&Value>, timestamp: String) {
        self.last_interaction = Some(timestamp);

        let Some(metadata) = metadata else {
            return;
        };

        if let Some(intent) = metadata.get("intent").and_then(Value::as_str) {
            if !self.topics_discussed.iter().any(|t| t == intent) {
                self.topics_discussed.push(intent.to_string());
            }
        }

        if let Some(step) = metadata.get("workflow_step").and_then(Value::as_u64) {
            self.conversation_flow = format!("step_{}", step);
        }
    }
}

/// Read a JSON record, treating missing or unreadable values as default.
pub(crate) fn load_json<T>(storage: &dyn Storage, key: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    match storage.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "Ignoring unreadable stored record");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Storage read failed");
            T::default()
        }
    }
}

pub(crate) fn store_json<T: Serialize>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    storage.set(key, &serde_json::to_string(value)?)
}

// endregion: --- Stored records
