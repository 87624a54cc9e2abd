//! Persistence for user preferences.
//!
//! Preferences are a flat string map stored as `preferences.json` in the
//! platform config directory (on macOS `~/Library/Application Support/session-monitor/`).
//! Two entries live there: the demo-mode flag and the custom session name
//! map. Reads and writes of either never fail from the caller's point of
//! view: an unavailable backend reads as "off" or as no names.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key holding the demo-mode flag
pub const DEMO_MODE_KEY: &str = "demoMode";

/// Key-value preference backend
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Preferences persisted as a JSON object of strings
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

/// Config directory (e.g. `~/Library/Application Support/session-monitor/`).
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("session-monitor"))
}

impl JsonFileStore {
    /// Store at the default location
    pub fn open_default() -> Result<Self> {
        let dir = config_dir().ok_or(Error::ConfigDirNotFound)?;
        Ok(Self::at(dir.join("preferences.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unparsable files read as empty
    fn load(&self) -> Result<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents).unwrap_or_else(|e| {
                debug!("ignoring invalid preferences file {}: {}", self.path.display(), e);
                HashMap::new()
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        atomic_write(&self.path, json.as_bytes())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// Write bytes to a file atomically: write to a temp file in the same
/// directory, then rename over the target. Prevents partial JSON on crash.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store; `failing()` builds one whose every call errors
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        if self.unavailable {
            return Err(Error::Unavailable);
        }
        Ok(self
            .values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner))
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Demo-mode flag
// ---------------------------------------------------------------------------

/// Persisted demo flag; true only for the exact value `"true"`
pub fn load_demo_flag(store: &dyn PreferenceStore) -> bool {
    match store.get(DEMO_MODE_KEY) {
        Ok(value) => value.as_deref() == Some("true"),
        Err(e) => {
            debug!("demo flag unavailable, treating as off: {}", e);
            false
        }
    }
}

/// Persist the demo flag, logging and swallowing failures
pub fn save_demo_flag(store: &dyn PreferenceStore, enabled: bool) {
    let value = if enabled { "true" } else { "false" };
    if let Err(e) = store.set(DEMO_MODE_KEY, value) {
        warn!("Failed to persist demo flag: {}", e);
    }
}

// ---------------------------------------------------------------------------
// Custom session names
// ---------------------------------------------------------------------------

/// Key holding the custom name map, stored as a JSON object string
pub const CUSTOM_NAMES_KEY: &str = "customNames";

/// User-chosen display names keyed by session id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomNames {
    names: HashMap<String, String>,
}

impl CustomNames {
    /// Load the persisted map. An unavailable store or a malformed value
    /// reads as an empty map.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let raw = match store.get(CUSTOM_NAMES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                debug!("custom names unavailable: {}", e);
                return Self::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!("ignoring invalid custom names: {}", e);
            Self::default()
        })
    }

    pub fn save(&self, store: &dyn PreferenceStore) -> Result<()> {
        store.set(CUSTOM_NAMES_KEY, &serde_json::to_string(self)?)
    }

    pub fn get(&self, session_id: &str) -> Option<&str> {
        self.names.get(session_id).map(String::as_str)
    }

    /// Name a session. A blank name removes the entry.
    pub fn set(&mut self, session_id: impl Into<String>, name: &str) {
        let session_id = session_id.into();
        let name = name.trim();
        if name.is_empty() {
            self.names.remove(&session_id);
        } else {
            self.names.insert(session_id, name.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Load, rename one session and persist, logging and swallowing failures
pub fn save_custom_name(store: &dyn PreferenceStore, session_id: &str, name: &str) {
    let mut names = CustomNames::load(store);
    names.set(session_id, name);
    if let Err(e) = names.save(store) {
        warn!("Failed to persist custom name for {}: {}", session_id, e);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
