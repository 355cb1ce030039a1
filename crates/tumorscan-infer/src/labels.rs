//! Ordered class labels, index-aligned with the model's output vector.
//!
//! Labels come from a JSON side-car artifact (a plain array of strings,
//! e.g. `["glioma", "meningioma", "no_tumor", "pituitary"]`) produced
//! alongside the trained model. The ordering must match the model's output
//! dimension ordering; that alignment is an external invariant the service
//! cannot verify, but a length mismatch is caught at prediction time.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading the label artifact at startup.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Failed to read labels file {0}: {1}")]
    Io(PathBuf, String),

    #[error("Failed to parse labels file {0}: {1}")]
    Parse(PathBuf, String),

    #[error("Labels file {0} contains no classes")]
    Empty(PathBuf),
}

/// Immutable, process-lifetime set of class names.
#[derive(Debug, Clone)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Load labels from a JSON array-of-strings file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LabelError::Io(path.to_path_buf(), e.to_string()))?;

        let labels: Vec<String> = serde_json::from_str(&content)
            .map_err(|e| LabelError::Parse(path.to_path_buf(), e.to_string()))?;

        if labels.is_empty() {
            return Err(LabelError::Empty(path.to_path_buf()));
        }

        Ok(Self { labels })
    }

    /// Build a label set directly from an ordered list of names.
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Label at output position `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}
