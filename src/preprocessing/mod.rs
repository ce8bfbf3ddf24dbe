//! Image preprocessing module for OCR enhancement
//!
//! Applies a fixed chain of format-level filters before the image is handed
//! to an engine. Failing filters are skipped rather than aborting the chain.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PreprocessingResult, Preset, Step, StepTiming};
