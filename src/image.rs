//
// image.rs
// Dcm2Png-rs
//
// Turns normalized 8-bit sample planes into grayscale or RGB images and writes them as PNG.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use ndarray::ArrayView3;

use crate::error::{ConvertError, Result};

/// Build an image from a `[rows, columns, samples]` plane.
/// Returns `None` for sample counts PNG export does not handle (anything but 1 or 3).
pub fn to_dynamic_image(pixels: ArrayView3<u8>) -> Option<DynamicImage> {
    let (rows, columns, samples) = pixels.dim();
    let width = u32::try_from(columns).ok()?;
    let height = u32::try_from(rows).ok()?;
    // Logical iteration order is row-major whatever the memory layout.
    let buffer: Vec<u8> = pixels.iter().copied().collect();

    match samples {
        1 => GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
        _ => None,
    }
}

pub fn save_png(pixels: ArrayView3<u8>, output: &Path) -> Result<()> {
    let dynamic_image = to_dynamic_image(pixels).ok_or_else(|| ConvertError::UnsupportedShape {
        path: output.to_path_buf(),
        shape: pixels.shape().to_vec(),
    })?;

    dynamic_image
        .save_with_format(output, ImageFormat::Png)
        .map_err(|source| ConvertError::Encode {
            path: output.to_path_buf(),
            source,
        })
}
