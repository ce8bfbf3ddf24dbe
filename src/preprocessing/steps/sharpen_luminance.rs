use crate::error::OcrError;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

/// Unsharp gain applied to the luminance detail
pub const SHARPNESS: f32 = 0.5;
/// Blur radius of the unsharp reference
pub const RADIUS: f32 = 1.69;

/// Sharpen luminance only, so colour fringes are not amplified
pub fn apply(image: &DynamicImage) -> Result<DynamicImage, OcrError> {
    sharpen(image, SHARPNESS)
}

/// Unsharp mask on the luma channel. The luma delta is added equally to
/// each colour channel; alpha is untouched.
pub fn sharpen(image: &DynamicImage, sharpness: f32) -> Result<DynamicImage, OcrError> {
    if !sharpness.is_finite() || sharpness < 0.0 {
        return Err(OcrError::PreprocessingError(format!(
            "invalid luminance sharpness {}",
            sharpness
        )));
    }

    let rgba = image.to_rgba8();
    let luma = image.to_luma8();
    let blurred = gaussian_blur_f32(&luma, RADIUS);

    let output = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let detail = luma.get_pixel(x, y).0[0] as f32 - blurred.get_pixel(x, y).0[0] as f32;
        let delta = sharpness * detail;

        let shift = |c: u8| (c as f32 + delta).round().clamp(0.0, 255.0) as u8;
        Rgba([shift(pixel[0]), shift(pixel[1]), shift(pixel[2]), pixel[3]])
    });

    Ok(DynamicImage::ImageRgba8(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_sharpen_enhances_edges() {
        // Create image with an edge (left half dark, right half light)
        let img = GrayImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Luma([50])
            } else {
                Luma([200])
            }
        });

        let result = apply(&DynamicImage::ImageLuma8(img)).unwrap();
        let result_gray = result.to_luma8();

        let edge_left = result_gray.get_pixel(9, 5).0[0];
        let edge_right = result_gray.get_pixel(10, 5).0[0];

        let original_diff = 200i32 - 50;
        let result_diff = (edge_right as i32 - edge_left as i32).abs();

        assert!(
            result_diff > original_diff,
            "Edge should be enhanced: {} > {}",
            result_diff,
            original_diff
        );
    }

    #[test]
    fn test_sharpen_leaves_flat_regions() {
        let img = GrayImage::from_pixel(12, 12, Luma([90]));
        let result = apply(&DynamicImage::ImageLuma8(img)).unwrap().to_luma8();

        for pixel in result.pixels() {
            assert!((pixel.0[0] as i32 - 90).abs() <= 1);
        }
    }

    #[test]
    fn test_sharpen_rejects_negative() {
        let img = DynamicImage::new_rgb8(2, 2);
        assert!(sharpen(&img, -0.5).is_err());
    }
}
