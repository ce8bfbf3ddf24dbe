//! Durable key-value preference storage.
//!
//! Recognition settings are read from a `PreferenceStore` at startup and
//! written back on every change. `JsonFileStore` keeps all keys in a single
//! JSON object on disk; `MemoryStore` backs tests and ephemeral sessions.

use crate::error::OcrError;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Key holding the ordered list of recognition language tags.
pub const KEY_SELECTED_LANGUAGES: &str = "selectedLanguages";
/// Key holding the minimum text height (fraction of image height).
pub const KEY_MINIMUM_TEXT_HEIGHT: &str = "minimumTextHeight";
/// Key holding the language-correction flag.
pub const KEY_USE_LANGUAGE_CORRECTION: &str = "useLanguageCorrection";
/// Key holding the automatic language detection flag.
pub const KEY_AUTO_DETECT_LANGUAGE: &str = "autoDetectLanguage";

/// A key -> value store for user preferences.
pub trait PreferenceStore: Send {
    /// Returns the stored value, or `None` if the key was never written.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores a value, replacing any previous one.
    fn set(&mut self, key: &str, value: Value) -> Result<(), OcrError>;
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), OcrError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as one pretty-printed JSON object.
///
/// The whole file is rewritten on each `set`, via a temp file in the same
/// directory so a crash never leaves a half-written document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: HashMap<String, Value>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty. A file that is not a JSON object is
    /// treated as empty too, and will be overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, OcrError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable preferences at {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(OcrError::Preferences(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!("Loaded {} preference(s) from {:?}", values.len(), path);
        Ok(Self { path, values })
    }

    /// Default location: `<config dir>/text-extractor/preferences.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("text-extractor")
            .join("preferences.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), OcrError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .map_err(|e| OcrError::Preferences(format!("Failed to create config dir: {}", e)))?;

        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| OcrError::Preferences(format!("Failed to serialize preferences: {}", e)))?;

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| OcrError::Preferences(format!("Failed to create temp file: {}", e)))?;
        file.write_all(json.as_bytes())
            .map_err(|e| OcrError::Preferences(format!("Failed to write preferences: {}", e)))?;
        file.persist(&self.path)
            .map_err(|e| OcrError::Preferences(format!("Failed to save preferences: {}", e)))?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), OcrError> {
        self.values.insert(key.to_string(), value);
        self.persist()?;
        tracing::debug!("Saved preference '{}' to {:?}", key, self.path);
        Ok(())
    }
}
