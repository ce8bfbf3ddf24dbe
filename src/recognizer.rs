use crate::engine::{OcrEngine, PixelBuffer, RecognitionRequest, TextObservation};
use crate::error::OcrError;
use crate::settings::RecognitionConfiguration;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;

/// Hands images to an engine with the current configuration.
///
/// Engines block, so each call runs on tokio's blocking pool and the caller
/// awaits the outcome on its own task.
#[derive(Clone)]
pub struct Recognizer {
    engine: Arc<dyn OcrEngine>,
}

impl Recognizer {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Recognize text lines in `image`.
    ///
    /// An image that cannot be turned into a pixel buffer fails with
    /// `InvalidImage` before the engine is involved. Engine errors come back
    /// unchanged; an engine that yields no result set maps to `NoTextFound`.
    /// An empty result set is a valid, empty outcome.
    pub async fn recognize(
        &self,
        image: &DynamicImage,
        config: &RecognitionConfiguration,
    ) -> Result<Vec<TextObservation>, OcrError> {
        let buffer = PixelBuffer::from_image(image)?;
        let request = RecognitionRequest::from(config);

        tracing::info!(
            "Recognizing {}x{} image with {} ({}, languages: {})",
            buffer.width(),
            buffer.height(),
            self.engine.name(),
            request.recognition_level.as_str(),
            request.languages.join(",")
        );

        let start = Instant::now();
        let engine = Arc::clone(&self.engine);
        let output = tokio::task::spawn_blocking(move || engine.recognize(&buffer, &request))
            .await
            .map_err(|e| OcrError::Internal(format!("Recognition task failed: {}", e)))??;

        let observations = output.ok_or(OcrError::NoTextFound)?;
        tracing::debug!(
            "{} returned {} observation(s) in {}ms",
            self.engine.name(),
            observations.len(),
            start.elapsed().as_millis()
        );

        Ok(observations)
    }
}
