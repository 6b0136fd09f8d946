use crate::{error::ClassifyError, service::Classification};
use std::fmt;

/// `confidence * 100` cut (not rounded) to its first five characters. The
/// integer part is always kept whole.
pub fn format_confidence(confidence: f32) -> String {
    let full = format!("{:.6}", confidence * 100.0);
    let integer_len = full.find('.').unwrap_or(full.len());
    let mut truncated: String = full.chars().take(integer_len.max(5)).collect();
    if truncated.ends_with('.') {
        truncated.pop();
    }
    truncated
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prediction {
            Some(prediction) => write!(
                f,
                "{} : {}%",
                self.label,
                format_confidence(prediction.confidence)
            ),
            None => write!(f, "no confident class"),
        }
    }
}

/// What the interaction surface shows for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Pending,
    Ready(Classification),
    Failed(String),
}

impl From<Result<Classification, ClassifyError>> for Outcome {
    fn from(result: Result<Classification, ClassifyError>) -> Self {
        match result {
            Ok(classification) => Outcome::Ready(classification),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => write!(f, "PROCESSING IMAGE"),
            Outcome::Ready(classification) => write!(f, "{}", classification),
            Outcome::Failed(reason) => write!(f, "classification failed: {}", reason),
        }
    }
}
