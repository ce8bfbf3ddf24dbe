//! Recognition settings and their persistence.
//!
//! `RecognitionConfiguration` is the configuration handed to the OCR engine
//! on every request. It is loaded from a [`PreferenceStore`] with documented
//! defaults per key, and changed through partial updates that write the
//! persisted keys back to the store.

use crate::error::OcrError;
use crate::languages::{self, DEFAULT_LANGUAGE};
use crate::preferences::{
    PreferenceStore, KEY_AUTO_DETECT_LANGUAGE, KEY_MINIMUM_TEXT_HEIGHT, KEY_SELECTED_LANGUAGES,
    KEY_USE_LANGUAGE_CORRECTION,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

/// Default minimum text height, as a fraction of the image height.
pub const DEFAULT_MINIMUM_TEXT_HEIGHT: f32 = 0.1;

/// Engine-side speed/quality tradeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionLevel {
    Fast,
    #[default]
    Accurate,
}

impl RecognitionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Accurate => "accurate",
        }
    }
}

impl FromStr for RecognitionLevel {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "accurate" => Ok(Self::Accurate),
            other => Err(OcrError::InvalidConfiguration(format!(
                "unknown recognition level '{}' (expected 'fast' or 'accurate')",
                other
            ))),
        }
    }
}

/// Configuration passed to the OCR engine.
///
/// Invariants: `recognition_languages` is never empty and
/// `minimum_text_height` lies in (0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionConfiguration {
    minimum_text_height: f32,
    recognition_level: RecognitionLevel,
    use_language_correction: bool,
    custom_words: Vec<String>,
    automatically_detects_language: bool,
    recognition_languages: Vec<String>,
}

impl Default for RecognitionConfiguration {
    fn default() -> Self {
        Self {
            minimum_text_height: DEFAULT_MINIMUM_TEXT_HEIGHT,
            recognition_level: RecognitionLevel::Accurate,
            use_language_correction: true,
            custom_words: Vec::new(),
            automatically_detects_language: true,
            recognition_languages: vec![DEFAULT_LANGUAGE.to_string()],
        }
    }
}

/// Partial update: only the `Some` fields change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationUpdate {
    pub minimum_text_height: Option<f32>,
    pub recognition_level: Option<RecognitionLevel>,
    pub use_language_correction: Option<bool>,
    pub custom_words: Option<Vec<String>>,
    pub automatically_detects_language: Option<bool>,
    pub recognition_languages: Option<Vec<String>>,
}

impl ConfigurationUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RecognitionConfiguration {
    /// Load settings from the store, falling back to defaults per key.
    ///
    /// When no language preference exists yet, the default list is written
    /// back so later reads see it. A failure to write it is logged, not fatal.
    pub fn load(store: &mut dyn PreferenceStore) -> Self {
        let defaults = Self::default();

        let recognition_languages = match store.get(KEY_SELECTED_LANGUAGES) {
            Some(value) => match string_list(&value) {
                Some(langs) if !langs.is_empty() => dedup_languages(langs),
                _ => {
                    tracing::warn!(
                        "Stored '{}' is empty or malformed, using default",
                        KEY_SELECTED_LANGUAGES
                    );
                    defaults.recognition_languages.clone()
                }
            },
            None => {
                let langs = defaults.recognition_languages.clone();
                if let Err(e) = store.set(KEY_SELECTED_LANGUAGES, json!(langs)) {
                    tracing::warn!("Failed to store default languages: {}", e);
                }
                langs
            }
        };

        let minimum_text_height = store
            .get(KEY_MINIMUM_TEXT_HEIGHT)
            .and_then(|v| v.as_f64())
            .map(|h| h as f32)
            .filter(|h| valid_text_height(*h))
            .unwrap_or(defaults.minimum_text_height);

        let use_language_correction = store
            .get(KEY_USE_LANGUAGE_CORRECTION)
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.use_language_correction);

        let automatically_detects_language = store
            .get(KEY_AUTO_DETECT_LANGUAGE)
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.automatically_detects_language);

        Self {
            minimum_text_height,
            use_language_correction,
            automatically_detects_language,
            recognition_languages,
            ..defaults
        }
    }

    /// Apply a partial update and persist the changed keys.
    ///
    /// The whole update is validated before anything changes. If a store
    /// write fails, keys already written are put back and `self` is left as
    /// it was. Recognition level and custom words are session-only and never
    /// written to the store.
    pub fn update(
        &mut self,
        update: ConfigurationUpdate,
        store: &mut dyn PreferenceStore,
    ) -> Result<(), OcrError> {
        if let Some(height) = update.minimum_text_height {
            if !valid_text_height(height) {
                return Err(OcrError::InvalidConfiguration(format!(
                    "minimum text height must be in (0, 1], got {}",
                    height
                )));
            }
        }
        let languages = update
            .recognition_languages
            .map(validate_languages)
            .transpose()?;

        let mut next = self.clone();
        let mut writes: Vec<(&'static str, Value)> = Vec::new();

        if let Some(height) = update.minimum_text_height {
            next.minimum_text_height = height;
            writes.push((KEY_MINIMUM_TEXT_HEIGHT, json!(height as f64)));
        }
        if let Some(use_correction) = update.use_language_correction {
            next.use_language_correction = use_correction;
            writes.push((KEY_USE_LANGUAGE_CORRECTION, json!(use_correction)));
        }
        if let Some(auto_detect) = update.automatically_detects_language {
            next.automatically_detects_language = auto_detect;
            writes.push((KEY_AUTO_DETECT_LANGUAGE, json!(auto_detect)));
        }
        if let Some(langs) = languages {
            writes.push((KEY_SELECTED_LANGUAGES, json!(langs)));
            next.recognition_languages = langs;
        }
        if let Some(level) = update.recognition_level {
            next.recognition_level = level;
        }
        if let Some(words) = update.custom_words {
            next.custom_words = words;
        }

        for (done, (key, value)) in writes.iter().enumerate() {
            if let Err(e) = store.set(key, value.clone()) {
                self.restore(&writes[..done], store);
                return Err(e);
            }
        }

        *self = next;
        Ok(())
    }

    /// Replace the recognition languages and persist them.
    pub fn set_recognition_languages(
        &mut self,
        languages: Vec<String>,
        store: &mut dyn PreferenceStore,
    ) -> Result<(), OcrError> {
        self.update(
            ConfigurationUpdate {
                recognition_languages: Some(languages),
                ..Default::default()
            },
            store,
        )
    }

    // Best effort: the store already failed once.
    fn restore(&self, written: &[(&'static str, Value)], store: &mut dyn PreferenceStore) {
        for (key, _) in written {
            let previous = match *key {
                KEY_MINIMUM_TEXT_HEIGHT => json!(self.minimum_text_height as f64),
                KEY_USE_LANGUAGE_CORRECTION => json!(self.use_language_correction),
                KEY_AUTO_DETECT_LANGUAGE => json!(self.automatically_detects_language),
                _ => json!(self.recognition_languages),
            };
            if let Err(e) = store.set(key, previous) {
                tracing::warn!("Failed to restore preference '{}': {}", key, e);
            }
        }
    }

    pub fn minimum_text_height(&self) -> f32 {
        self.minimum_text_height
    }

    pub fn recognition_level(&self) -> RecognitionLevel {
        self.recognition_level
    }

    pub fn use_language_correction(&self) -> bool {
        self.use_language_correction
    }

    pub fn custom_words(&self) -> &[String] {
        &self.custom_words
    }

    pub fn automatically_detects_language(&self) -> bool {
        self.automatically_detects_language
    }

    pub fn recognition_languages(&self) -> &[String] {
        &self.recognition_languages
    }
}

fn valid_text_height(height: f32) -> bool {
    height.is_finite() && height > 0.0 && height <= 1.0
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn dedup_languages(languages: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(languages.len());
    for lang in languages {
        if !seen.contains(&lang) {
            seen.push(lang);
        }
    }
    seen
}

fn validate_languages(languages: Vec<String>) -> Result<Vec<String>, OcrError> {
    let languages: Vec<String> = languages
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    if languages.is_empty() {
        return Err(OcrError::InvalidConfiguration(
            "at least one recognition language is required".to_string(),
        ));
    }

    for lang in &languages {
        if !languages::is_supported(lang) {
            tracing::warn!("Language '{}' is not in the supported list", lang);
        }
    }

    Ok(dedup_languages(languages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryStore;

    #[test]
    fn test_defaults_when_store_is_empty() {
        let mut store = MemoryStore::new();
        let config = RecognitionConfiguration::load(&mut store);

        assert_eq!(config.recognition_languages(), ["en-US"]);
        assert_eq!(config.minimum_text_height(), 0.1);
        assert!(config.use_language_correction());
        assert!(config.automatically_detects_language());
        assert_eq!(config.recognition_level(), RecognitionLevel::Accurate);
        assert!(config.custom_words().is_empty());

        // Default language list is written back
        assert_eq!(store.get(KEY_SELECTED_LANGUAGES), Some(json!(["en-US"])));
    }

    #[test]
    fn test_non_positive_height_falls_back() {
        let mut store = MemoryStore::new();
        store.set(KEY_MINIMUM_TEXT_HEIGHT, json!(0.0)).unwrap();
        assert_eq!(RecognitionConfiguration::load(&mut store).minimum_text_height(), 0.1);

        store.set(KEY_MINIMUM_TEXT_HEIGHT, json!(-0.5)).unwrap();
        assert_eq!(RecognitionConfiguration::load(&mut store).minimum_text_height(), 0.1);
    }

    #[test]
    fn test_empty_stored_languages_fall_back() {
        let mut store = MemoryStore::new();
        store.set(KEY_SELECTED_LANGUAGES, json!([])).unwrap();
        let config = RecognitionConfiguration::load(&mut store);
        assert_eq!(config.recognition_languages(), ["en-US"]);
    }

    #[test]
    fn test_stored_values_are_loaded() {
        let mut store = MemoryStore::new();
        store
            .set(KEY_SELECTED_LANGUAGES, json!(["ja-JP", "en-US"]))
            .unwrap();
        store.set(KEY_MINIMUM_TEXT_HEIGHT, json!(0.25)).unwrap();
        store.set(KEY_USE_LANGUAGE_CORRECTION, json!(false)).unwrap();
        store.set(KEY_AUTO_DETECT_LANGUAGE, json!(false)).unwrap();

        let config = RecognitionConfiguration::load(&mut store);
        assert_eq!(config.recognition_languages(), ["ja-JP", "en-US"]);
        assert_eq!(config.minimum_text_height(), 0.25);
        assert!(!config.use_language_correction());
        assert!(!config.automatically_detects_language());
    }

    #[test]
    fn test_partial_update_only_touches_given_field() {
        let mut store = MemoryStore::new();
        let mut config = RecognitionConfiguration::load(&mut store);
        let before = config.clone();

        config
            .update(
                ConfigurationUpdate {
                    minimum_text_height: Some(0.3),
                    ..Default::default()
                },
                &mut store,
            )
            .unwrap();

        assert_eq!(config.minimum_text_height(), 0.3);
        assert_eq!(config.recognition_level(), before.recognition_level());
        assert_eq!(config.use_language_correction(), before.use_language_correction());
        assert_eq!(config.custom_words(), before.custom_words());
        assert_eq!(
            config.automatically_detects_language(),
            before.automatically_detects_language()
        );
        assert_eq!(config.recognition_languages(), before.recognition_languages());
    }

    #[test]
    fn test_update_persists_changed_keys() {
        let mut store = MemoryStore::new();
        let mut config = RecognitionConfiguration::load(&mut store);

        config
            .update(
                ConfigurationUpdate {
                    use_language_correction: Some(false),
                    automatically_detects_language: Some(false),
                    recognition_level: Some(RecognitionLevel::Fast),
                    custom_words: Some(vec!["Rustacean".to_string()]),
                    ..Default::default()
                },
                &mut store,
            )
            .unwrap();

        let reloaded = RecognitionConfiguration::load(&mut store);
        assert!(!reloaded.use_language_correction());
        assert!(!reloaded.automatically_detects_language());
        // Session-only fields are not persisted
        assert_eq!(reloaded.recognition_level(), RecognitionLevel::Accurate);
        assert!(reloaded.custom_words().is_empty());
    }

    #[test]
    fn test_languages_set_and_read_back_verbatim() {
        let mut store = MemoryStore::new();
        let mut config = RecognitionConfiguration::load(&mut store);

        let langs = vec!["de-DE".to_string(), "fr-FR".to_string()];
        config
            .set_recognition_languages(langs.clone(), &mut store)
            .unwrap();

        assert_eq!(config.recognition_languages(), langs.as_slice());
        let reloaded = RecognitionConfiguration::load(&mut store);
        assert_eq!(reloaded.recognition_languages(), langs.as_slice());
    }

    #[test]
    fn test_languages_deduplicated_in_order() {
        let mut store = MemoryStore::new();
        let mut config = RecognitionConfiguration::default();
        config
            .set_recognition_languages(
                vec!["ko-KR".into(), "en-US".into(), "ko-KR".into()],
                &mut store,
            )
            .unwrap();
        assert_eq!(config.recognition_languages(), ["ko-KR", "en-US"]);
    }

    #[test]
    fn test_empty_languages_rejected() {
        let mut store = MemoryStore::new();
        let mut config = RecognitionConfiguration::default();
        let result = config.set_recognition_languages(vec![" ".to_string()], &mut store);
        assert!(matches!(result, Err(OcrError::InvalidConfiguration(_))));
        assert_eq!(config.recognition_languages(), ["en-US"]);
    }

    #[test]
    fn test_invalid_height_rejected_atomically() {
        let mut store = MemoryStore::new();
        let mut config = RecognitionConfiguration::default();

        let result = config.update(
            ConfigurationUpdate {
                minimum_text_height: Some(1.5),
                use_language_correction: Some(false),
                ..Default::default()
            },
            &mut store,
        );

        assert!(matches!(result, Err(OcrError::InvalidConfiguration(_))));
        assert!(config.use_language_correction());
        assert!(store.get(KEY_USE_LANGUAGE_CORRECTION).is_none());
    }

    /// Fails every write to one key
    struct FailingStore {
        inner: MemoryStore,
        failing_key: &'static str,
    }

    impl PreferenceStore for FailingStore {
        fn get(&self, key: &str) -> Option<Value> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: Value) -> Result<(), OcrError> {
            if key == self.failing_key {
                return Err(OcrError::Preferences("disk full".to_string()));
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_failed_write_leaves_configuration_unchanged() {
        let mut store = FailingStore {
            inner: MemoryStore::new(),
            failing_key: KEY_USE_LANGUAGE_CORRECTION,
        };
        store.inner.set(KEY_MINIMUM_TEXT_HEIGHT, json!(0.2)).unwrap();
        let mut config = RecognitionConfiguration::load(&mut store);
        let before = config.clone();

        let result = config.update(
            ConfigurationUpdate {
                minimum_text_height: Some(0.3),
                use_language_correction: Some(false),
                automatically_detects_language: Some(false),
                recognition_level: Some(RecognitionLevel::Fast),
                ..Default::default()
            },
            &mut store,
        );

        assert!(matches!(result, Err(OcrError::Preferences(_))));
        assert_eq!(config, before);
        // The height written before the failure is put back
        let stored = store.get(KEY_MINIMUM_TEXT_HEIGHT).and_then(|v| v.as_f64());
        assert!((stored.unwrap() - 0.2).abs() < 1e-6);
        assert!(store.get(KEY_AUTO_DETECT_LANGUAGE).is_none());
        assert_eq!(RecognitionConfiguration::load(&mut store), before);
    }

    #[test]
    fn test_recognition_level_parse() {
        assert_eq!("FAST".parse::<RecognitionLevel>().unwrap(), RecognitionLevel::Fast);
        assert_eq!(
            "accurate".parse::<RecognitionLevel>().unwrap(),
            RecognitionLevel::Accurate
        );
        assert!("medium".parse::<RecognitionLevel>().is_err());
    }

    #[test]
    fn test_empty_update() {
        assert!(ConfigurationUpdate::default().is_empty());
        let update = ConfigurationUpdate {
            use_language_correction: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
