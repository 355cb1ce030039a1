//! Model abstraction and post-processing.
//!
//! When the `onnx` feature is enabled, [`OnnxModel`] loads an ONNX artifact
//! and runs inference through ONNX Runtime. Without the feature, a stub is
//! provided that returns an error at load time, so the rest of the pipeline
//! (and its tests) can be built without an ONNX Runtime install.

use crate::error::InferError;
use crate::labels::LabelSet;
use crate::preprocess::InputTensor;
use serde::Serialize;

/// A loaded classification model.
///
/// Implementations run synchronously; a call blocks until the model returns
/// its per-class score vector. Loaded once at startup and shared read-only
/// across requests.
pub trait Model: Send + Sync {
    /// Run inference, returning one score per class.
    fn predict(&self, input: &InputTensor) -> Result<Vec<f32>, InferError>;
}

/// A prediction vector translated into its top class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    /// Client-facing result string, e.g. `glioma (Confidence: 92.4%)`.
    pub fn display(&self) -> String {
        format!("{} (Confidence: {:.1}%)", self.label, self.confidence * 100.0)
    }
}

/// Index of the largest score; ties resolve to the lowest index.
///
/// NaN scores are skipped entirely, so they can neither win nor poison the
/// comparison; an all-NaN vector yields `None`.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            None => best = Some((i, score)),
            Some((_, top)) if score > top => best = Some((i, score)),
            _ => {}
        }
    }
    best.map(|(i, _)| i)
}

/// Translate a prediction vector into its top label and confidence.
///
/// The vector length must match the label count; a mismatch is a typed
/// failure rather than an out-of-range lookup.
pub fn top_prediction(scores: &[f32], labels: &LabelSet) -> Result<Prediction, InferError> {
    if scores.len() != labels.len() {
        return Err(InferError::LabelMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }

    let index = argmax(scores).ok_or(InferError::EmptyPrediction)?;
    let label = labels
        .get(index)
        .ok_or(InferError::LabelMismatch {
            scores: scores.len(),
            labels: labels.len(),
        })?
        .to_string();

    Ok(Prediction {
        label,
        confidence: scores[index],
    })
}

/// Full post-decode pipeline: predict, then argmax + label lookup.
pub fn classify(
    model: &dyn Model,
    labels: &LabelSet,
    input: &InputTensor,
) -> Result<Prediction, InferError> {
    let scores = model.predict(input)?;
    top_prediction(&scores, labels)
}

#[cfg(feature = "onnx")]
mod onnx {
    use super::Model;
    use crate::error::InferError;
    use crate::preprocess::InputTensor;
    use ort::{session::Session, value::Tensor};
    use std::path::Path;
    use std::sync::Mutex;

    /// An ONNX classification model loaded into ONNX Runtime.
    pub struct OnnxModel {
        // ort's run() takes &mut self, so concurrent requests serialize here.
        session: Mutex<Session>,
        input_name: String,
    }

    // SAFETY: Session is Send+Sync, wrapped in Mutex for mutable run()
    unsafe impl Send for OnnxModel {}
    unsafe impl Sync for OnnxModel {}

    impl OnnxModel {
        /// Load an ONNX model from a file path.
        pub fn load(path: &Path) -> Result<Self, InferError> {
            let session = Session::builder()
                .map_err(|e| InferError::Inference(format!("ONNX session builder error: {}", e)))?
                .commit_from_file(path)
                .map_err(|e| {
                    InferError::Inference(format!(
                        "Failed to load ONNX model '{}': {}",
                        path.display(),
                        e
                    ))
                })?;

            // Read the first input tensor name from the model
            let input_name = session
                .inputs()
                .first()
                .map(|i| i.name().to_string())
                .unwrap_or_else(|| "input".to_string());

            Ok(OnnxModel {
                session: Mutex::new(session),
                input_name,
            })
        }
    }

    impl Model for OnnxModel {
        fn predict(&self, input: &InputTensor) -> Result<Vec<f32>, InferError> {
            let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();

            // (shape, data) tuple form — compatible with ort's OwnedTensorArrayData
            let tensor = Tensor::from_array((shape, input.data().to_vec()))
                .map_err(|e| InferError::Inference(format!("Tensor creation error: {}", e)))?;

            let mut session = self
                .session
                .lock()
                .map_err(|e| InferError::Inference(format!("Session lock error: {}", e)))?;

            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => tensor])
                .map_err(|e| InferError::Inference(format!("ONNX inference error: {}", e)))?;

            // First output tensor holds the per-class scores
            let (_, scores) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| InferError::Inference(format!("Output tensor extract error: {}", e)))?;

            Ok(scores.to_vec())
        }
    }
}

#[cfg(not(feature = "onnx"))]
mod onnx {
    use super::Model;
    use crate::error::InferError;
    use crate::preprocess::InputTensor;
    use std::path::Path;

    /// Stub `OnnxModel` when the `onnx` feature is not enabled.
    #[derive(Debug)]
    pub struct OnnxModel;

    impl OnnxModel {
        pub fn load(_path: &Path) -> Result<Self, InferError> {
            Err(InferError::Inference(
                "ONNX support requires the 'onnx' feature — rebuild with: cargo build --features onnx"
                    .to_string(),
            ))
        }
    }

    impl Model for OnnxModel {
        fn predict(&self, _input: &InputTensor) -> Result<Vec<f32>, InferError> {
            Err(InferError::Inference(
                "ONNX support requires the 'onnx' feature".to_string(),
            ))
        }
    }
}

pub use onnx::OnnxModel;
