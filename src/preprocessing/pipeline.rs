use crate::error::OcrError;
use image::DynamicImage;
use serde::Serialize;
use std::str::FromStr;
use std::time::Instant;

use super::steps;

/// Which filter chain runs before recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Hand the image to the engine untouched
    None,
    /// Contrast/brightness, noise reduction, luminance sharpening
    #[default]
    Enhance,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Enhance => "enhance",
        }
    }
}

impl FromStr for Preset {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "enhance" => Ok(Self::Enhance),
            other => Err(OcrError::InvalidConfiguration(format!(
                "unknown preprocessing preset '{}' (expected 'none' or 'enhance')",
                other
            ))),
        }
    }
}

/// A single filter in the chain
pub type StepFn = fn(&DynamicImage) -> Result<DynamicImage, OcrError>;

#[derive(Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub apply: StepFn,
}

impl Step {
    pub const fn new(name: &'static str, apply: StepFn) -> Self {
        Self { name, apply }
    }
}

/// The fixed enhancement chain, in order
pub const ENHANCE_STEPS: [Step; 3] = [
    Step::new("color_controls", steps::color_controls::apply),
    Step::new("noise_reduction", steps::noise_reduction::apply),
    Step::new("sharpen_luminance", steps::sharpen_luminance::apply),
];

#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
    /// False when the step failed and its input was passed on unchanged
    pub applied: bool,
}

/// The filtered image plus what happened to it.
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    #[serde(skip)]
    pub image: DynamicImage,
    pub total_time_ms: u64,
    pub preset: String,
    pub steps: Vec<StepTiming>,
    /// The filtered image could not be rendered, so the input was returned
    pub used_original: bool,
}

/// Runs the filter chain for a preset, timing each filter.
pub struct Pipeline {
    preset: Preset,
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(preset: Preset) -> Self {
        let steps = match preset {
            Preset::None => Vec::new(),
            Preset::Enhance => ENHANCE_STEPS.to_vec(),
        };
        Self { preset, steps }
    }

    /// Pipeline running a custom chain under the `enhance` preset
    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            preset: Preset::Enhance,
            steps,
        }
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Run the chain on `image`.
    ///
    /// A step that fails passes its input on unchanged. If the final image
    /// cannot be rendered back to a raster of the input's size, the original
    /// is returned instead. Only an input with no pixels is an error.
    pub fn process(&self, image: &DynamicImage) -> Result<PreprocessingResult, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::ImageProcessingFailed);
        }

        let start = Instant::now();
        let mut steps_timing = Vec::with_capacity(self.steps.len());

        if self.steps.is_empty() {
            return Ok(PreprocessingResult {
                image: image.clone(),
                total_time_ms: 0,
                preset: self.preset.as_str().to_string(),
                steps: steps_timing,
                used_original: false,
            });
        }

        let mut img = image.clone();
        for step in &self.steps {
            img = self.run_step(step, img, &mut steps_timing);
        }

        let (img, used_original) = match render(img, image.width(), image.height()) {
            Some(rendered) => (rendered, false),
            None => {
                tracing::warn!("Preprocessed image could not be rendered, using original");
                (image.clone(), true)
            }
        };

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            "Preprocessing ({}) finished in {}ms",
            self.preset.as_str(),
            total_time_ms
        );

        Ok(PreprocessingResult {
            image: img,
            total_time_ms,
            preset: self.preset.as_str().to_string(),
            steps: steps_timing,
            used_original,
        })
    }

    fn run_step(
        &self,
        step: &Step,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
    ) -> DynamicImage {
        let step_start = Instant::now();
        let (result, applied) = match (step.apply)(&img) {
            Ok(out) => (out, true),
            Err(e) => {
                tracing::warn!("Preprocessing step '{}' failed, skipping: {}", step.name, e);
                (img, false)
            }
        };
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::debug!("Step '{}' took {}ms (applied: {})", step.name, time_ms, applied);
        timings.push(StepTiming {
            name: step.name.to_string(),
            time_ms,
            applied,
        });
        result
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Preset::default())
    }
}

/// Flatten the filtered image to RGBA8. `None` if it no longer matches the
/// input's extent.
fn render(image: DynamicImage, width: u32, height: u32) -> Option<DynamicImage> {
    if image.width() != width || image.height() != height {
        return None;
    }
    Some(DynamicImage::ImageRgba8(image.into_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(8, 6, |x, y| {
            Rgba([(x * 30) as u8, (y * 40) as u8, 100, 255])
        }))
    }

    fn failing_step(_: &DynamicImage) -> Result<DynamicImage, OcrError> {
        Err(OcrError::PreprocessingError("boom".to_string()))
    }

    fn shrinking_step(_: &DynamicImage) -> Result<DynamicImage, OcrError> {
        Ok(DynamicImage::new_rgba8(0, 0))
    }

    fn invert_step(img: &DynamicImage) -> Result<DynamicImage, OcrError> {
        let mut out = img.clone();
        out.invert();
        Ok(out)
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("none".parse::<Preset>().unwrap(), Preset::None);
        assert_eq!("Enhance".parse::<Preset>().unwrap(), Preset::Enhance);
        assert!("aggressive".parse::<Preset>().is_err());
        assert_eq!(Preset::default(), Preset::Enhance);
    }

    #[test]
    fn test_enhance_runs_steps_in_order() {
        let result = Pipeline::new(Preset::Enhance).process(&sample_image()).unwrap();

        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["color_controls", "noise_reduction", "sharpen_luminance"]);
        assert!(result.steps.iter().all(|s| s.applied));
        assert!(!result.used_original);
        assert_eq!(result.image.width(), 8);
        assert_eq!(result.image.height(), 6);
        assert_eq!(result.preset, "enhance");
    }

    #[test]
    fn test_none_preset_is_identity() {
        let input = sample_image();
        let pipeline = Pipeline::new(Preset::None);
        assert_eq!(pipeline.preset(), Preset::None);
        let result = pipeline.process(&input).unwrap();

        assert!(result.steps.is_empty());
        assert_eq!(result.image.to_rgba8(), input.to_rgba8());
    }

    #[test]
    fn test_failed_step_passes_input_forward() {
        let input = sample_image();
        let pipeline = Pipeline::with_steps(vec![
            Step::new("broken", failing_step),
            Step::new("invert", invert_step),
        ]);

        let result = pipeline.process(&input).unwrap();

        assert!(!result.steps[0].applied);
        assert!(result.steps[1].applied);

        let mut expected = input.clone();
        expected.invert();
        assert_eq!(result.image.to_rgba8(), expected.to_rgba8());
    }

    #[test]
    fn test_unrenderable_output_returns_original() {
        let input = sample_image();
        let pipeline = Pipeline::with_steps(vec![
            Step::new("invert", invert_step),
            Step::new("shrink", shrinking_step),
        ]);

        let result = pipeline.process(&input).unwrap();

        assert!(result.used_original);
        assert_eq!(result.image.to_rgba8(), input.to_rgba8());
    }

    #[test]
    fn test_empty_input_fails() {
        let result = Pipeline::default().process(&DynamicImage::new_rgb8(0, 0));
        assert!(matches!(result, Err(OcrError::ImageProcessingFailed)));
    }
}
