//! Photo-to-text extraction.
//!
//! An image is enhanced by a fixed preprocessing chain, handed to an OCR
//! engine together with the stored recognition settings, and the engine's
//! line observations are reduced to one confidence-ranked text.

pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod extractor;
pub mod languages;
pub mod preferences;
pub mod preprocessing;
pub mod recognizer;
pub mod reducer;
pub mod search;
pub mod settings;
pub mod state;

pub use engine::{OcrEngine, PixelBuffer, RecognitionRequest, TextObservation};
pub use error::OcrError;
pub use extractor::TextExtractor;
pub use reducer::{reduce, RecognitionResult};
pub use settings::{ConfigurationUpdate, RecognitionConfiguration, RecognitionLevel};
