//! Individual preprocessing steps

pub mod color_controls;
pub mod noise_reduction;
pub mod sharpen_luminance;

use image::Rgba;

/// Map a 0..1 channel value back to u8, clamping out-of-range results
pub(crate) fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rec. 709 luminance of an RGBA pixel, in 0..1
pub(crate) fn luminance(pixel: &Rgba<u8>) -> f32 {
    (0.2126 * pixel[0] as f32 + 0.7152 * pixel[1] as f32 + 0.0722 * pixel[2] as f32) / 255.0
}
