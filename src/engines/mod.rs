//! Concrete recognition backends.
//!
//! Each backend sits behind a cargo feature; `EngineRegistry` collects the
//! compiled-in ones and hands out the one a run asks for.

#[cfg(feature = "engine-ocrs")]
pub mod heuristics;

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
pub mod models;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use serde::Serialize;
use std::sync::Arc;

/// What `text-extractor engines` prints per backend.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub supported_languages: Vec<String>,
    /// Used when a run names no engine
    pub preferred: bool,
}

/// Compiled-in engines, in preference order. The first one is the fallback
/// when a run does not name an engine.
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl EngineRegistry {
    /// Initialize every backend enabled at build time.
    ///
    /// Backends may download model files on first use, so this can block.
    #[allow(unused_variables, unused_mut)]
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let mut engines: Vec<Arc<dyn OcrEngine>> = Vec::new();

        #[cfg(feature = "engine-ocrs")]
        {
            tracing::info!("Loading ocrs models");
            engines.push(Arc::new(ocrs::OcrsEngine::new(config)?));
        }

        #[cfg(feature = "engine-leptess")]
        {
            tracing::info!("Loading tesseract language data");
            engines.push(Arc::new(leptess::LeptessEngine::new(config)?));
        }

        Self::from_engines(engines)
    }

    pub fn from_engines(engines: Vec<Arc<dyn OcrEngine>>) -> Result<Self, OcrError> {
        if engines.is_empty() {
            return Err(OcrError::InitializationError(
                "no OCR engine compiled in; enable the engine-ocrs or engine-leptess feature"
                    .to_string(),
            ));
        }
        Ok(Self { engines })
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines
            .iter()
            .find(|engine| engine.name().eq_ignore_ascii_case(name))
            .map(Arc::clone)
    }

    /// Look up `name`, or take the preferred engine when none is given.
    pub fn select(&self, name: Option<&str>) -> Result<Arc<dyn OcrEngine>, OcrError> {
        let Some(name) = name else {
            return Ok(Arc::clone(&self.engines[0]));
        };
        self.get(name).ok_or_else(|| {
            OcrError::InvalidConfiguration(format!(
                "unknown engine '{}' (available: {})",
                name,
                self.names().join(", ")
            ))
        })
    }

    pub fn preferred_name(&self) -> &'static str {
        self.engines[0].name()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|engine| engine.name()).collect()
    }

    pub fn info(&self) -> Vec<EngineInfo> {
        let describe = |engine: &Arc<dyn OcrEngine>| EngineInfo {
            name: engine.name(),
            description: engine.description(),
            supported_languages: engine.supported_languages(),
            preferred: engine.name() == self.preferred_name(),
        };
        self.engines.iter().map(describe).collect()
    }
}
