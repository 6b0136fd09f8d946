//! Image preprocessing for fixed-size image classifiers: frame transforms,
//! resampling to a square input and conversion to a normalized tensor.

pub mod config;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod normalize;
pub mod preprocessor;
pub mod resample;

pub use config::{DEFAULT_INPUT_SIZE, DEFAULT_MEAN, DEFAULT_STD};
pub use error::PreprocessError;
pub use geometry::{AffineTransform, build_transform};
pub use loader::{image_from_packed_argb, load_image, unpack_rgb};
pub use normalize::{NormalizedTensor, normalize, normalize_packed};
pub use preprocessor::Preprocessor;
pub use resample::{ResampleFilter, resample, warp_affine};

/// 8-bit RGB image, row-major.
pub type Image = ::image::RgbImage;
