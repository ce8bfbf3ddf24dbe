use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("The provided image is invalid: {0}")]
    InvalidImage(String),

    #[error("Failed to process the image")]
    ImageProcessingFailed,

    #[error("No text was found in the image")]
    NoTextFound,

    /// Reserved. No threshold is applied by the reducer, so nothing raises this yet.
    #[error("The text recognition confidence is too low: {confidence:.2} (threshold: {threshold:.2})")]
    LowConfidence { confidence: f32, threshold: f32 },

    #[error("Preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("OCR engine failed: {0}")]
    EngineError(String),

    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("A recognition is already in progress")]
    RecognitionInProgress,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Preference store error: {0}")]
    Preferences(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable failure, printed by `extract --json`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl From<&OcrError> for ErrorResponse {
    fn from(err: &OcrError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code(),
        }
    }
}

impl OcrError {
    pub fn code(&self) -> &'static str {
        match self {
            OcrError::InvalidImage(_) => "INVALID_IMAGE",
            OcrError::ImageProcessingFailed => "IMAGE_PROCESSING_FAILED",
            OcrError::NoTextFound => "NO_TEXT_FOUND",
            OcrError::LowConfidence { .. } => "LOW_CONFIDENCE",
            OcrError::PreprocessingError(_) => "PREPROCESSING_ERROR",
            OcrError::EngineError(_) => "ENGINE_ERROR",
            OcrError::InitializationError(_) => "INIT_ERROR",
            OcrError::RecognitionInProgress => "RECOGNITION_IN_PROGRESS",
            OcrError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            OcrError::Preferences(_) => "PREFERENCES_ERROR",
            OcrError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
