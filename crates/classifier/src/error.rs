use preprocess::PreprocessError;
use std::time::Duration;
use thiserror::Error;

/// Every way a classification request can fail. Callers render these as a
/// distinct failure state rather than leaving the previous result in place.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model returned {actual} scores, expected {expected}")]
    OutputSize { expected: usize, actual: usize },

    #[error("A classification is already in flight")]
    Busy,

    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("Classification worker exited without a result")]
    WorkerLost,

    #[error("Inference engine unusable after an earlier panic")]
    EnginePoisoned,

    #[error("Failed to start classification worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl ClassifyError {
    pub(crate) fn inference(err: anyhow::Error) -> Self {
        Self::Inference(format!("{:#}", err))
    }
}
