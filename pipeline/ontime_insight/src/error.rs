use ontime_model::ModelError;
use thiserror::Error;

/// A submission that could not produce a label
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("preprocessing failed: {0}")]
    Transform(#[source] ModelError),
    #[error("classification failed: {0}")]
    Classify(#[source] ModelError),
    #[error("label decoding failed: {0}")]
    Decode(#[source] ModelError),
}

/// A label was produced but could not be explained
///
/// Never fatal: the label stands and the failure is shown inline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExplanationError {
    #[error("attribution failed: {0}")]
    Attribution(#[source] ModelError),
    #[error("explainer returned {scores} scores for {names} feature names")]
    ShapeMismatch { names: usize, scores: usize },
    #[error("explainer returned no attributions")]
    NoAttributions,
}
