//! Inference pipeline for the tumorscan classification service.
//!
//! This crate holds everything between raw uploaded bytes and a final
//! prediction: image decoding and preprocessing, the label set loaded from a
//! side-car JSON artifact, the model abstraction with its ONNX Runtime
//! backend, and post-processing (argmax + confidence). The HTTP surface
//! lives in `tumorscan-server`.

pub mod error;
pub mod labels;
pub mod metrics;
pub mod model;
pub mod preprocess;

pub use error::InferError;
pub use labels::LabelSet;
pub use model::{argmax, classify, top_prediction, Model, OnnxModel, Prediction};
pub use preprocess::{preprocess, InputTensor, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};
