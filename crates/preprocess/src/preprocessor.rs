use crate::{
    NormalizedTensor, ResampleFilter,
    config::{DEFAULT_INPUT_SIZE, DEFAULT_MEAN, DEFAULT_STD},
    error::PreprocessError,
    normalize::normalize,
    resample::resample,
};
use common::span;
use image::RgbImage;

/// Resample-then-normalize for a fixed-size square classifier input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessor {
    pub size: u32,
    pub mean: f32,
    pub std: f32,
    pub filter: ResampleFilter,
}

impl Preprocessor {
    pub fn new(size: u32, mean: f32, std: f32) -> Self {
        Self {
            size,
            mean,
            std,
            filter: ResampleFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn preprocess(&self, image: &RgbImage) -> Result<NormalizedTensor, PreprocessError> {
        let _s = span!("preprocess_image");

        tracing::trace!(
            width = image.width(),
            height = image.height(),
            size = self.size,
            filter = ?self.filter,
            "Preprocessing image"
        );

        let resized = resample(image, self.size, self.filter)?;
        normalize(&resized, self.size, self.mean, self.std)
    }

    /// Model input shape `[1, size, size, 3]`.
    pub fn input_shape(&self) -> [usize; 4] {
        let side = self.size as usize;
        [1, side, side, 3]
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE, DEFAULT_MEAN, DEFAULT_STD)
    }
}
