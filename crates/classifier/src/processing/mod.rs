pub mod post;

pub use post::{Prediction, decode_top1};
