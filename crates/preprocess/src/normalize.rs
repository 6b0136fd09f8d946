use crate::{error::PreprocessError, loader::unpack_rgb};
use common::span;
use image::RgbImage;
use ndarray::{Array, ArrayViewD, IxDyn};

/// Model input of shape `[1, size, size, 3]`: row-major pixels, RGB interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: Array<f32, IxDyn>,
}

impl NormalizedTensor {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat values in pixel-interleaved order.
    pub fn as_slice(&self) -> &[f32] {
        // Built with from_shape_vec in standard layout
        self.data.as_slice().unwrap_or(&[])
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }
}

/// Convert a `size x size` image into `(channel - mean) / std` values.
pub fn normalize(
    image: &RgbImage,
    size: u32,
    mean: f32,
    std: f32,
) -> Result<NormalizedTensor, PreprocessError> {
    let _s = span!("normalize");

    if image.width() != size || image.height() != size {
        return Err(PreprocessError::InvalidDimensions {
            width: image.width(),
            height: image.height(),
        });
    }

    let pixels = image.as_raw().chunks_exact(3).map(|px| [px[0], px[1], px[2]]);
    build_tensor(pixels, size, mean, std)
}

/// Same as [`normalize`] for row-major packed `0xAARRGGBB` pixels.
pub fn normalize_packed(
    pixels: &[u32],
    size: u32,
    mean: f32,
    std: f32,
) -> Result<NormalizedTensor, PreprocessError> {
    let expected = size as usize * size as usize;
    if pixels.len() != expected {
        return Err(PreprocessError::SizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }

    build_tensor(pixels.iter().map(|&px| unpack_rgb(px)), size, mean, std)
}

fn build_tensor(
    pixels: impl Iterator<Item = [u8; 3]>,
    size: u32,
    mean: f32,
    std: f32,
) -> Result<NormalizedTensor, PreprocessError> {
    if std == 0.0 {
        return Err(PreprocessError::ZeroStd);
    }

    let side = size as usize;
    let mut output = Vec::with_capacity(3 * side * side);
    for rgb in pixels {
        for channel in rgb {
            output.push((channel as f32 - mean) / std);
        }
    }

    let actual = output.len();
    let data = Array::from_shape_vec(IxDyn(&[1, side, side, 3]), output).map_err(|_| {
        PreprocessError::SizeMismatch {
            expected: 3 * side * side,
            actual,
        }
    })?;

    Ok(NormalizedTensor { data })
}
