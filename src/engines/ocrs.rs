//! Recognition with the ocrs neural models.
//!
//! The detection and recognition models are fetched into the cache directory
//! the first time the engine is built.
//!
//! ocrs reads Latin script only and reports no scores, so each recognized
//! line is rated with [`line_confidence`]. Language correction, custom words
//! and language detection have no ocrs counterpart and are ignored.

use super::heuristics::line_confidence;
use super::models;
use crate::config::Config;
use crate::engine::{OcrEngine, PixelBuffer, RecognitionRequest, TextObservation};
use crate::error::OcrError;
use crate::languages;
use crate::settings::RecognitionLevel;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use rten_imageproc::BoundingRect;
use std::path::Path;

// Published by the ocrs project
const DETECTION_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// Beam width used for the accurate recognition level
const BEAM_WIDTH: u32 = 20;

/// Language tags ocrs can read (Latin script)
const LATIN_LANGUAGES: &[&str] = &["en-US", "fr-FR", "es-ES", "de-DE", "it-IT", "pt-BR"];

/// One ocrs pipeline per recognition level; they share the model files.
pub struct OcrsEngine {
    fast: OcrsOcrEngine,
    accurate: OcrsOcrEngine,
}

impl OcrsEngine {
    pub fn new(_config: &Config) -> Result<Self, OcrError> {
        tracing::debug!("Preparing ocrs models in {:?}", models::cache_dir());

        let dir = models::cache_dir();
        let detection = models::ensure_downloaded(DETECTION_URL, &dir, "text-detection.rten")?;
        let recognition =
            models::ensure_downloaded(RECOGNITION_URL, &dir, "text-recognition.rten")?;

        let fast = build_engine(&detection, &recognition, DecodeMethod::Greedy)?;
        let accurate = build_engine(
            &detection,
            &recognition,
            DecodeMethod::BeamSearch { width: BEAM_WIDTH },
        )?;

        tracing::info!("ocrs ready (greedy and beam-search decoders)");

        Ok(Self { fast, accurate })
    }

    fn engine_for(&self, level: RecognitionLevel) -> &OcrsOcrEngine {
        match level {
            RecognitionLevel::Fast => &self.fast,
            RecognitionLevel::Accurate => &self.accurate,
        }
    }
}

fn load_model(path: &Path) -> Result<Model, OcrError> {
    Model::load_file(path).map_err(|e| {
        OcrError::InitializationError(format!("Cannot load model {}: {}", path.display(), e))
    })
}

fn build_engine(
    detection: &Path,
    recognition: &Path,
    decode_method: DecodeMethod,
) -> Result<OcrsOcrEngine, OcrError> {
    let params = OcrEngineParams {
        detection_model: Some(load_model(detection)?),
        recognition_model: Some(load_model(recognition)?),
        decode_method,
        ..Default::default()
    };
    OcrsOcrEngine::new(params)
        .map_err(|e| OcrError::InitializationError(format!("ocrs rejected its models: {}", e)))
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Neural OCR in pure Rust, Latin script only"
    }

    fn recognize(
        &self,
        image: &PixelBuffer,
        request: &RecognitionRequest,
    ) -> Result<Option<Vec<TextObservation>>, OcrError> {
        if let Some(lang) = request
            .languages
            .iter()
            .find(|l| !LATIN_LANGUAGES.contains(&l.as_str()))
        {
            let name = languages::display_name(lang).unwrap_or(lang.as_str());
            tracing::warn!("ocrs only reads Latin script; {} may not be recognized", name);
        }

        let engine = self.engine_for(request.recognition_level);

        // ImageSource::from_bytes expects HWC RGB8, which is PixelBuffer's layout
        let img_source = ImageSource::from_bytes(image.as_bytes(), image.dimensions())
            .map_err(|e| OcrError::EngineError(format!("Failed to create image source: {}", e)))?;

        let ocr_input = engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::EngineError(format!("Failed to prepare input: {}", e)))?;

        let word_rects = engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::EngineError(format!("Failed to detect words: {}", e)))?;

        // Drop lines shorter than the configured fraction of the image height
        let min_height = request.minimum_text_height * image.height() as f32;
        let all_lines = engine.find_text_lines(&ocr_input, &word_rects);
        let detected = all_lines.len();
        let line_rects: Vec<_> = all_lines
            .into_iter()
            .filter(|line| {
                line.iter()
                    .map(|rect| rect.bounding_rect().height())
                    .fold(0.0f32, f32::max)
                    >= min_height
            })
            .collect();

        let line_texts = engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::EngineError(format!("Failed to recognize text: {}", e)))?;

        let observations: Vec<TextObservation> = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.trim().is_empty())
            .map(|text| {
                let confidence = line_confidence(&text);
                TextObservation::new(text, confidence)
            })
            .collect();

        tracing::debug!(
            "ocrs recognized {} line(s), {} of {} detected lines below minimum height",
            observations.len(),
            detected - line_rects.len(),
            detected
        );

        Ok(Some(observations))
    }

    fn supported_languages(&self) -> Vec<String> {
        LATIN_LANGUAGES.iter().map(|l| l.to_string()).collect()
    }
}
