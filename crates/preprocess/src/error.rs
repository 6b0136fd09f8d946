use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessError {
    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i32),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Standard deviation must be non-zero")]
    ZeroStd,

    #[error("Transform is not invertible")]
    SingularTransform,

    #[error("Resize failed: {0}")]
    Resize(String),

    #[error("Image decode failed: {0}")]
    Decode(String),
}
