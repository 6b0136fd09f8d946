use crate::error::PreprocessError;
use image::{Rgb, RgbImage};
use std::path::Path;

/// Decode an image file into 8-bit RGB, dropping any alpha channel.
pub fn load_image(path: impl AsRef<Path>) -> Result<RgbImage, PreprocessError> {
    let path = path.as_ref();
    let decoded = image::open(path)
        .map_err(|e| PreprocessError::Decode(format!("{}: {}", path.display(), e)))?;

    let rgb = decoded.to_rgb8();
    tracing::debug!(
        path = %path.display(),
        width = rgb.width(),
        height = rgb.height(),
        "Loaded image"
    );
    Ok(rgb)
}

/// Split a packed `0xAARRGGBB` pixel into its red, green and blue bytes.
#[inline]
pub fn unpack_rgb(pixel: u32) -> [u8; 3] {
    [
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
    ]
}

/// Build an RGB image from row-major packed ARGB pixels.
pub fn image_from_packed_argb(
    width: u32,
    height: u32,
    pixels: &[u32],
) -> Result<RgbImage, PreprocessError> {
    if width == 0 || height == 0 {
        return Err(PreprocessError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize;
    if pixels.len() != expected {
        return Err(PreprocessError::SizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }

    Ok(RgbImage::from_fn(width, height, |x, y| {
        Rgb(unpack_rgb(pixels[(y * width + x) as usize]))
    }))
}
