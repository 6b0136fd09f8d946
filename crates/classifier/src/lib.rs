//! Top-1 image classification: drives a feed/run/fetch inference engine on a
//! preprocessed image and turns the score vector into a labeled prediction.

pub mod backend;
pub mod config;
pub mod display;
pub mod error;
pub mod labels;
pub mod logging;
pub mod processing;
pub mod service;

pub const SERVICE_NAME: &str = "classifier";

// Re-export commonly used types for convenience
pub use backend::{ExecutionProvider, InferenceBackend, ModelSpec};
pub use config::ClassifierConfig;
pub use display::{Outcome, format_confidence};
pub use error::ClassifyError;
pub use labels::{LabelError, LabelTable, resolve_label};
pub use processing::{Prediction, decode_top1};
pub use service::{Classification, Classifier, Pending};
