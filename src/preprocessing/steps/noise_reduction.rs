use crate::error::OcrError;
use image::{DynamicImage, Rgba, RgbaImage};

use super::{luminance, unit_to_u8};

/// Luminance deviation (0..1) below which a pixel counts as noise
pub const NOISE_LEVEL: f32 = 0.02;
/// Gain applied to detail that survives the noise test
pub const SHARPNESS: f32 = 0.4;

const BLUR_SIGMA: f32 = 1.0;

/// Smooth low-amplitude grain while keeping glyph edges crisp
pub fn apply(image: &DynamicImage) -> Result<DynamicImage, OcrError> {
    reduce(image, NOISE_LEVEL, SHARPNESS)
}

/// Compare each pixel with a Gaussian-blurred reference. Deviations under
/// `noise_level` take the blurred value; larger ones are treated as detail and
/// pushed away from the reference by `sharpness`.
pub fn reduce(
    image: &DynamicImage,
    noise_level: f32,
    sharpness: f32,
) -> Result<DynamicImage, OcrError> {
    if !noise_level.is_finite() || noise_level < 0.0 || !sharpness.is_finite() {
        return Err(OcrError::PreprocessingError(format!(
            "invalid noise reduction (noise level {}, sharpness {})",
            noise_level, sharpness
        )));
    }

    let rgba = image.to_rgba8();
    let blurred = image::imageops::blur(&rgba, BLUR_SIGMA);

    let output = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let original = rgba.get_pixel(x, y);
        let reference = blurred.get_pixel(x, y);
        let deviation = (luminance(original) - luminance(reference)).abs();

        if deviation < noise_level {
            Rgba([reference[0], reference[1], reference[2], original[3]])
        } else {
            let mut out = *original;
            for c in 0..3 {
                let o = original[c] as f32 / 255.0;
                let r = reference[c] as f32 / 255.0;
                out[c] = unit_to_u8(o + sharpness * (o - r));
            }
            out
        }
    });

    Ok(DynamicImage::ImageRgba8(output))
}
