//! Recognition with a statically linked Tesseract.
//!
//! Traineddata for each requested language is fetched from tessdata_fast the
//! first time it is needed, unless a tessdata directory was configured.
//!
//! Tesseract only reports a page-level mean confidence, so every line of a
//! page carries that same score.

use super::models;
use crate::config::Config;
use crate::engine::{OcrEngine, PixelBuffer, RecognitionRequest, TextObservation};
use crate::error::OcrError;
use image::ImageFormat;
use std::path::PathBuf;
use tesseract_static::tesseract::Tesseract;

/// Language tag -> tessdata code
const TESSDATA_CODES: &[(&str, &str)] = &[
    ("en-US", "eng"),
    ("fr-FR", "fra"),
    ("es-ES", "spa"),
    ("de-DE", "deu"),
    ("it-IT", "ita"),
    ("pt-BR", "por"),
    ("zh-Hans", "chi_sim"),
    ("zh-Hant", "chi_tra"),
    ("ja-JP", "jpn"),
    ("ko-KR", "kor"),
];

const FALLBACK_CODE: &str = "eng";

pub struct LeptessEngine {
    /// Directory holding `<code>.traineddata` files
    tessdata_dir: PathBuf,
    /// Explicit tessdata directory from configuration; never downloaded into
    user_supplied: bool,
}

impl LeptessEngine {
    /// Fails early if even the English data cannot be loaded.
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let engine = match &config.tessdata_path {
            Some(path) => Self {
                tessdata_dir: PathBuf::from(path),
                user_supplied: true,
            },
            None => Self {
                tessdata_dir: models::cache_dir().join("tessdata"),
                user_supplied: false,
            },
        };

        let tessdata = engine.ensure_languages(&[FALLBACK_CODE])?;
        Tesseract::new(Some(&tessdata), Some(FALLBACK_CODE)).map_err(|e| {
            OcrError::InitializationError(format!("Tesseract cannot start: {}", e))
        })?;

        tracing::info!("Tesseract ready, tessdata in {:?}", engine.tessdata_dir);

        Ok(engine)
    }

    /// Make sure traineddata for every code exists, returning the tessdata dir
    fn ensure_languages(&self, codes: &[&str]) -> Result<String, OcrError> {
        if !self.user_supplied {
            for code in codes {
                let filename = format!("{}.traineddata", code);
                models::ensure_downloaded(&tessdata_url(code), &self.tessdata_dir, &filename)?;
            }
        }

        self.tessdata_dir.to_str().map(str::to_owned).ok_or_else(|| {
            OcrError::InitializationError(format!(
                "tessdata path {:?} is not valid UTF-8",
                self.tessdata_dir
            ))
        })
    }
}

/// Map language tags to tessdata codes; unknown tags are skipped
fn tessdata_codes(languages: &[String]) -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = languages
        .iter()
        .filter_map(|tag| {
            let code = TESSDATA_CODES
                .iter()
                .find(|(t, _)| *t == tag.as_str())
                .map(|(_, code)| *code);
            if code.is_none() {
                tracing::warn!("No tessdata for language '{}', skipping", tag);
            }
            code
        })
        .collect();
    codes.dedup();
    if codes.is_empty() {
        codes.push(FALLBACK_CODE);
    }
    codes
}

const TESSDATA_BASE_URL: &str = "https://github.com/tesseract-ocr/tessdata_fast/raw/main";

fn tessdata_url(code: &str) -> String {
    format!("{}/{}.traineddata", TESSDATA_BASE_URL, code)
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract LSTM models, many scripts, page-level confidence"
    }

    fn recognize(
        &self,
        image: &PixelBuffer,
        request: &RecognitionRequest,
    ) -> Result<Option<Vec<TextObservation>>, OcrError> {
        let codes = tessdata_codes(&request.languages);
        let tessdata = self.ensure_languages(&codes)?;
        let language = codes.join("+");

        // leptonica reads BMP without any optional codec
        let mut bmp = Vec::new();
        image
            .as_rgb()
            .write_to(&mut std::io::Cursor::new(&mut bmp), ImageFormat::Bmp)
            .map_err(|e| OcrError::EngineError(format!("BMP encoding failed: {}", e)))?;
        tracing::debug!("Tesseract [{}] on {:?}", language, image.dimensions());

        let engine_error = |stage: &str, e: &dyn std::fmt::Display| {
            OcrError::EngineError(format!("Tesseract {} failed: {}", stage, e))
        };
        let mut tess = Tesseract::new(Some(&tessdata), Some(&language))
            .map_err(|e| engine_error("setup", &e))?
            .set_image_from_mem(&bmp)
            .map_err(|e| engine_error("image load", &e))?
            .recognize()
            .map_err(|e| engine_error("recognition", &e))?;
        let text = tess.get_text().map_err(|e| engine_error("text readout", &e))?;

        // Negative means Tesseract produced no result for the page
        let mean_confidence = tess.mean_text_conf();
        if mean_confidence < 0 {
            return Ok(None);
        }
        let confidence = (mean_confidence as f32 / 100.0).clamp(0.0, 1.0);

        let observations = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| TextObservation::new(line, confidence))
            .collect();

        Ok(Some(observations))
    }

    fn supported_languages(&self) -> Vec<String> {
        TESSDATA_CODES.iter().map(|(tag, _)| tag.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tessdata_codes_maps_known_tags() {
        let codes = tessdata_codes(&["ja-JP".to_string(), "en-US".to_string()]);
        assert_eq!(codes, vec!["jpn", "eng"]);
    }

    #[test]
    fn test_tessdata_codes_falls_back_to_english() {
        let codes = tessdata_codes(&["xx-XX".to_string()]);
        assert_eq!(codes, vec!["eng"]);
    }
}
