use crate::error::OcrError;
use crate::settings::{RecognitionConfiguration, RecognitionLevel};
use image::{DynamicImage, RgbImage};

/// One candidate line of recognized text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextObservation {
    pub text: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl TextObservation {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Packed RGB8 (HWC) pixels, the format every engine consumes.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: RgbImage,
}

impl PixelBuffer {
    /// Prepare an image for an engine. Zero-sized rasters are rejected.
    pub fn from_image(image: &DynamicImage) -> Result<Self, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::InvalidImage(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }
        Ok(Self {
            image: image.to_rgb8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Raw bytes, row-major, 3 bytes per pixel.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }
}

/// Snapshot of the configuration for a single engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub recognition_level: RecognitionLevel,
    pub languages: Vec<String>,
    pub use_language_correction: bool,
    pub minimum_text_height: f32,
    pub custom_words: Vec<String>,
    pub automatically_detects_language: bool,
}

impl From<&RecognitionConfiguration> for RecognitionRequest {
    fn from(config: &RecognitionConfiguration) -> Self {
        Self {
            recognition_level: config.recognition_level(),
            languages: config.recognition_languages().to_vec(),
            use_language_correction: config.use_language_correction(),
            minimum_text_height: config.minimum_text_height(),
            custom_words: config.custom_words().to_vec(),
            automatically_detects_language: config.automatically_detects_language(),
        }
    }
}

/// Trait that all OCR engines must implement
///
/// Engines are blocking; the recognizer runs them off the async runtime.
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text lines in `image`.
    ///
    /// `Ok(None)` means the engine produced no result set at all, which is
    /// different from an empty one.
    fn recognize(
        &self,
        image: &PixelBuffer,
        request: &RecognitionRequest,
    ) -> Result<Option<Vec<TextObservation>>, OcrError>;

    /// Language tags this engine can honour
    fn supported_languages(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_pixel_buffer_is_rgb() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 2, Luma([7])));
        let buffer = PixelBuffer::from_image(&img).unwrap();
        assert_eq!(buffer.dimensions(), (4, 2));
        assert_eq!(buffer.as_bytes().len(), 4 * 2 * 3);
        assert!(buffer.as_bytes().iter().all(|b| *b == 7));
    }

    #[test]
    fn test_pixel_buffer_rejects_empty() {
        let img = DynamicImage::new_rgb8(0, 10);
        assert!(matches!(
            PixelBuffer::from_image(&img),
            Err(OcrError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_request_from_configuration() {
        let config = RecognitionConfiguration::default();
        let request = RecognitionRequest::from(&config);
        assert_eq!(request.languages, vec!["en-US".to_string()]);
        assert_eq!(request.recognition_level, RecognitionLevel::Accurate);
        assert!(request.use_language_correction);
        assert!(request.automatically_detects_language);
        assert_eq!(request.minimum_text_height, 0.1);
        assert!(request.custom_words.is_empty());
    }
}
