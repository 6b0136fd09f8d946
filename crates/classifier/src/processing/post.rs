/// Top-1 class and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub confidence: f32,
}

/// Highest-scoring class, or `None` when no score is strictly above zero.
///
/// Only a strictly greater score replaces the current best, so ties resolve
/// to the lowest index and NaN never wins.
pub fn decode_top1(scores: &[f32]) -> Option<Prediction> {
    let mut best: Option<Prediction> = None;
    let mut best_confidence = 0.0f32;

    for (index, &value) in scores.iter().enumerate() {
        if value > best_confidence {
            best_confidence = value;
            best = Some(Prediction {
                index,
                confidence: value,
            });
        }
    }

    best
}
