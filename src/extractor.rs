//! End-to-end text extraction.
//!
//! `TextExtractor` owns the recognition configuration and the published
//! state. One `extract` runs decode -> preprocess -> recognize -> reduce and
//! applies the outcome to the published state on the caller's task. Only one
//! extraction may be in flight; a second is rejected rather than queued.

use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::preferences::PreferenceStore;
use crate::preprocessing::Pipeline;
use crate::recognizer::Recognizer;
use crate::reducer::{reduce, RecognitionResult};
use crate::search;
use crate::settings::{ConfigurationUpdate, RecognitionConfiguration};
use crate::state::{PublishedState, StateEvent, StateStore};
use image::DynamicImage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

struct Settings {
    configuration: RecognitionConfiguration,
    store: Box<dyn PreferenceStore>,
}

pub struct TextExtractor {
    recognizer: Recognizer,
    pipeline: Arc<Pipeline>,
    settings: Mutex<Settings>,
    state: StateStore,
}

impl TextExtractor {
    /// Build an extractor, loading the configuration from `store`.
    pub fn new(
        engine: Arc<dyn OcrEngine>,
        pipeline: Pipeline,
        mut store: Box<dyn PreferenceStore>,
    ) -> Self {
        let configuration = RecognitionConfiguration::load(store.as_mut());
        tracing::debug!("Loaded recognition configuration: {:?}", configuration);

        Self {
            recognizer: Recognizer::new(engine),
            pipeline: Arc::new(pipeline),
            settings: Mutex::new(Settings {
                configuration,
                store,
            }),
            state: StateStore::new(),
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.recognizer.engine_name()
    }

    /// Snapshot of the configuration the next extraction will use.
    pub fn configuration(&self) -> RecognitionConfiguration {
        self.settings().configuration.clone()
    }

    /// Apply a partial update and persist it.
    pub fn update_configuration(&self, update: ConfigurationUpdate) -> Result<(), OcrError> {
        let mut settings = self.settings();
        let Settings {
            configuration,
            store,
        } = &mut *settings;
        configuration.update(update, store.as_mut())
    }

    pub fn set_recognition_languages(&self, languages: Vec<String>) -> Result<(), OcrError> {
        let mut settings = self.settings();
        let Settings {
            configuration,
            store,
        } = &mut *settings;
        configuration.set_recognition_languages(languages, store.as_mut())
    }

    pub fn state(&self) -> PublishedState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.state.subscribe()
    }

    /// Replace the user's edited copy of the text.
    pub fn edit_text(&self, text: impl Into<String>) {
        self.state.edit_text(text);
    }

    /// Lines of the edited text that contain `query`, ignoring case.
    pub fn search(&self, query: &str) -> String {
        search::filter_lines(&self.state.snapshot().edited_text, query)
    }

    /// Decode encoded image bytes and extract their text.
    ///
    /// Undecodable bytes fail with `InvalidImage`; the engine is not called
    /// and the published state is not touched.
    pub async fn extract_bytes(&self, bytes: &[u8]) -> Result<RecognitionResult, OcrError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| OcrError::InvalidImage(format!("Failed to decode image: {}", e)))?;
        self.extract(image).await
    }

    /// Run the full pipeline on `image` and publish the result.
    ///
    /// On failure the previously published result stays in place. There is
    /// no cancellation: dropping the returned future publishes a failure and
    /// frees the in-flight slot, but work already handed to the blocking pool
    /// runs to completion and its result is discarded.
    pub async fn extract(&self, image: DynamicImage) -> Result<RecognitionResult, OcrError> {
        let guard = self.state.begin_processing().ok_or_else(|| {
            tracing::warn!("Rejecting extraction: another one is in progress");
            OcrError::RecognitionInProgress
        })?;

        match self.run(image).await {
            Ok(result) => {
                tracing::info!(
                    "Extraction finished: {} line(s), average confidence {:.2}",
                    result.combined_text.lines().count(),
                    result.average_confidence
                );
                guard.publish(&result);
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Extraction failed: {}", e);
                guard.fail(&e);
                Err(e)
            }
        }
    }

    async fn run(&self, image: DynamicImage) -> Result<RecognitionResult, OcrError> {
        let pipeline = Arc::clone(&self.pipeline);
        let preprocessed = tokio::task::spawn_blocking(move || pipeline.process(&image))
            .await
            .map_err(|e| OcrError::Internal(format!("Preprocessing task failed: {}", e)))??;
        tracing::debug!(
            "Preprocessed with '{}' preset in {}ms (original kept: {})",
            self.pipeline.preset().as_str(),
            preprocessed.total_time_ms,
            preprocessed.used_original
        );

        let configuration = self.configuration();
        let observations = self
            .recognizer
            .recognize(&preprocessed.image, &configuration)
            .await?;

        Ok(reduce(observations))
    }

    fn settings(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
