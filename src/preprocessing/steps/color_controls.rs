use crate::error::OcrError;
use image::DynamicImage;

use super::unit_to_u8;

/// Contrast gain around mid-gray
pub const CONTRAST: f32 = 1.1;
/// Brightness offset, in 0..1 channel units
pub const BRIGHTNESS: f32 = 0.1;

/// Boost contrast and brightness slightly so faint print separates from paper
pub fn apply(image: &DynamicImage) -> Result<DynamicImage, OcrError> {
    adjust(image, CONTRAST, BRIGHTNESS)
}

/// `out = (c - 0.5) * contrast + 0.5 + brightness` on each colour channel.
/// Alpha is left alone.
pub fn adjust(
    image: &DynamicImage,
    contrast: f32,
    brightness: f32,
) -> Result<DynamicImage, OcrError> {
    if !contrast.is_finite() || contrast < 0.0 || !brightness.is_finite() {
        return Err(OcrError::PreprocessingError(format!(
            "invalid color controls (contrast {}, brightness {})",
            contrast, brightness
        )));
    }

    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            let value = *channel as f32 / 255.0;
            *channel = unit_to_u8((value - 0.5) * contrast + 0.5 + brightness);
        }
    }

    Ok(DynamicImage::ImageRgba8(rgba))
}
