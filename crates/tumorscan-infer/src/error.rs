//! Error types for the inference pipeline.

use thiserror::Error;

/// Failures in the decode → preprocess → predict → post-process pipeline.
///
/// Client input problems (missing multipart field, empty filename) never
/// reach this enum; they are handled in the route layer. Everything here
/// surfaces to the caller as a 500 with the message echoed in the body.
#[derive(Debug, Error)]
pub enum InferError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Model returned {scores} scores but {labels} labels are configured")]
    LabelMismatch { scores: usize, labels: usize },

    #[error("Model returned an empty prediction vector")]
    EmptyPrediction,
}
