//! Delivery performance model artifacts
//!
//! Loads a fitted pipeline (column transformer + tree ensemble) and its label
//! decoder from JSON, evaluates them on single rows, and explains individual
//! predictions with exact TreeSHAP attributions.

pub mod ensemble;
pub mod error;
pub mod label;
pub mod pipeline;
pub mod preprocess;
pub mod row;
pub mod shap;
pub mod tree;

pub use ensemble::{Classifier, EnsembleKind, TreeEnsemble, TreeEnsembleSpec};
pub use error::{ArtifactError, ModelError};
pub use label::LabelDecoder;
pub use pipeline::{ArtifactPaths, Artifacts, Pipeline, PipelineSpec, StageSpec};
pub use preprocess::{
    strip_stage_prefix, ColumnTransformer, HandleUnknown, Preprocessor, Transformer,
    TransformerKind, STAGE_SEPARATOR,
};
pub use row::{CellValue, Row};
pub use shap::{Attribution, Explainer, TreeExplainer};
pub use tree::{DecisionTree, TreeArrays};
