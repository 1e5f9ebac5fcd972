//! Error types for artifact loading and model evaluation

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while evaluating a loaded model on one row
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("column '{column}' expects a {expected} value")]
    ColumnType {
        column: String,
        expected: &'static str,
    },
    #[error("unknown category '{value}' for column '{column}'")]
    UnknownCategory { column: String, value: String },
    #[error("column '{0}' is not a finite number")]
    NonFinite(String),
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
    #[error("class index {index} is outside the {n_classes} known classes")]
    ClassOutOfRange { index: usize, n_classes: usize },
}

/// Errors raised while loading the serialized artifacts
///
/// Every variant is fatal at startup; there is nothing to retry.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .path.display())]
    Missing { path: PathBuf },
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact '{}': {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("pipeline has no step named '{0}'")]
    MissingStage(String),
    #[error("pipeline step '{name}' is a {found}, expected a {expected}")]
    StageKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

impl ArtifactError {
    /// True when the artifact file does not exist at all
    pub fn is_missing(&self) -> bool {
        matches!(self, ArtifactError::Missing { .. })
    }
}
