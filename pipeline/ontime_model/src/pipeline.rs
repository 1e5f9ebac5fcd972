//! Artifact loading: the fitted pipeline and its label decoder

use crate::ensemble::{Classifier, TreeEnsemble, TreeEnsembleSpec};
use crate::error::ArtifactError;
use crate::label::LabelDecoder;
use crate::preprocess::{ColumnTransformer, Preprocessor};
use crate::shap::TreeExplainer;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PIPELINE_FILE: &str = "pipeline_model_binary.json";
pub const LABEL_ENCODER_FILE: &str = "label_encoder.json";

pub const PREPROCESSOR_STEP: &str = "preprocessor";
pub const CLASSIFIER_STEP: &str = "classifier";

/// One serialized pipeline step
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageSpec {
    ColumnTransformer(ColumnTransformer),
    TreeEnsemble(TreeEnsembleSpec),
}

impl StageSpec {
    fn kind_name(&self) -> &'static str {
        match self {
            StageSpec::ColumnTransformer(_) => "column_transformer",
            StageSpec::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

/// Serialized pipeline: an ordered list of `(name, step)` pairs
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSpec {
    pub steps: Vec<(String, StageSpec)>,
}

impl PipelineSpec {
    fn take_step(&mut self, name: &str) -> Result<StageSpec, ArtifactError> {
        let idx = self
            .steps
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| ArtifactError::MissingStage(name.to_string()))?;
        Ok(self.steps.remove(idx).1)
    }
}

/// A fitted preprocessing + classification pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    preprocessor: ColumnTransformer,
    classifier: Arc<TreeEnsemble>,
}

impl TryFrom<PipelineSpec> for Pipeline {
    type Error = ArtifactError;

    fn try_from(mut spec: PipelineSpec) -> Result<Self, Self::Error> {
        let preprocessor = match spec.take_step(PREPROCESSOR_STEP)? {
            StageSpec::ColumnTransformer(ct) => ct,
            other => {
                return Err(ArtifactError::StageKind {
                    name: PREPROCESSOR_STEP.into(),
                    expected: "column_transformer",
                    found: other.kind_name(),
                })
            }
        };
        let classifier = match spec.take_step(CLASSIFIER_STEP)? {
            StageSpec::TreeEnsemble(ensemble) => TreeEnsemble::try_from(ensemble)?,
            other => {
                return Err(ArtifactError::StageKind {
                    name: CLASSIFIER_STEP.into(),
                    expected: "tree_ensemble",
                    found: other.kind_name(),
                })
            }
        };
        Self::new(preprocessor, classifier)
    }
}

impl Pipeline {
    pub fn new(
        preprocessor: ColumnTransformer,
        classifier: TreeEnsemble,
    ) -> Result<Self, ArtifactError> {
        preprocessor.validate()?;
        if preprocessor.n_features_out() != classifier.n_features() {
            return Err(ArtifactError::Invalid(format!(
                "preprocessor produces {} features but the classifier expects {}",
                preprocessor.n_features_out(),
                classifier.n_features()
            )));
        }
        Ok(Self {
            preprocessor,
            classifier: Arc::new(classifier),
        })
    }

    pub fn preprocessor(&self) -> &ColumnTransformer {
        &self.preprocessor
    }

    pub fn classifier(&self) -> Arc<TreeEnsemble> {
        Arc::clone(&self.classifier)
    }

    /// TreeSHAP explainer bound to this pipeline's classifier
    pub fn explainer(&self) -> TreeExplainer {
        TreeExplainer::new(self.classifier())
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        self.preprocessor.feature_names_out()
    }
}

/// Where the two artifact files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub pipeline: PathBuf,
    pub label_encoder: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            pipeline: dir.join(PIPELINE_FILE),
            label_encoder: dir.join(LABEL_ENCODER_FILE),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

/// Everything loaded at startup
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub pipeline: Pipeline,
    pub label_decoder: LabelDecoder,
}

impl Artifacts {
    pub fn new(pipeline: Pipeline, label_decoder: LabelDecoder) -> Result<Self, ArtifactError> {
        let n_classes = pipeline.classifier.n_classes();
        if label_decoder.classes().len() != n_classes {
            return Err(ArtifactError::Invalid(format!(
                "label decoder knows {} classes but the classifier predicts {n_classes}",
                label_decoder.classes().len()
            )));
        }
        Ok(Self {
            pipeline,
            label_decoder,
        })
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let spec: PipelineSpec = read_json(&paths.pipeline)?;
        let pipeline = Pipeline::try_from(spec)?;
        log::info!(
            "loaded pipeline from {}: {} features out, {} trees",
            paths.pipeline.display(),
            pipeline.preprocessor.n_features_out(),
            pipeline.classifier.n_trees()
        );

        let label_decoder: LabelDecoder = read_json(&paths.label_encoder)?;
        log::info!(
            "loaded label decoder from {}: classes {:?}",
            paths.label_encoder.display(),
            label_decoder.classes()
        );

        Self::new(pipeline, label_decoder)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ArtifactError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PIPELINE_JSON: &str = r#"{
        "steps": [
            ["preprocessor", {"type": "column_transformer", "transformers": [
                {"name": "scaler", "kind": "standard_scaler",
                 "columns": ["Jarak"], "mean": [10.0], "scale": [5.0]},
                {"name": "onehot", "kind": "one_hot",
                 "columns": ["Festival"], "categories": [["No", "Yes"]]}
            ]}],
            ["classifier", {"type": "tree_ensemble", "kind": "random_forest",
             "n_features": 3, "n_classes": 2,
             "trees": [{"children_left": [1, -1, -1], "children_right": [2, -1, -1],
                        "feature": [0, -2, -2], "threshold": [0.0, -2.0, -2.0],
                        "value": [[5, 5], [1, 4], [4, 1]],
                        "n_node_samples": [10, 5, 5]}]}]
        ]
    }"#;

    fn write_artifacts(dir: &Path, pipeline: &str, encoder: &str) -> ArtifactPaths {
        let paths = ArtifactPaths::in_dir(dir);
        fs::write(&paths.pipeline, pipeline).unwrap();
        fs::write(&paths.label_encoder, encoder).unwrap();
        paths
    }

    #[test]
    fn loads_named_steps_and_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path(), PIPELINE_JSON, r#"{"classes":["Late","On Time"]}"#);
        let artifacts = Artifacts::load(&paths).unwrap();
        assert_eq!(
            artifacts.pipeline.feature_names_out(),
            vec!["scaler__Jarak", "onehot__Festival_No", "onehot__Festival_Yes"]
        );
        assert_eq!(artifacts.label_decoder.classes().len(), 2);
    }

    #[test]
    fn missing_files_are_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let err = Artifacts::load(&paths).unwrap_err();
        assert!(err.is_missing());

        fs::write(&paths.pipeline, PIPELINE_JSON).unwrap();
        match Artifacts::load(&paths).unwrap_err() {
            ArtifactError::Missing { path } => assert_eq!(path, paths.label_encoder),
            other => panic!("expected missing label encoder, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_not_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path(), "{ not json", r#"{"classes":["a","b"]}"#);
        let err = Artifacts::load(&paths).unwrap_err();
        assert!(matches!(err, ArtifactError::Malformed { .. }));
        assert!(!err.is_missing());
    }

    #[test]
    fn steps_are_resolved_by_name_and_kind() {
        let renamed = PIPELINE_JSON.replace("\"classifier\"", "\"model\"");
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path(), &renamed, r#"{"classes":["a","b"]}"#);
        assert!(matches!(
            Artifacts::load(&paths).unwrap_err(),
            ArtifactError::MissingStage(name) if name == CLASSIFIER_STEP
        ));

        let swapped = PIPELINE_JSON
            .replace("\"preprocessor\"", "\"tmp\"")
            .replace("\"classifier\"", "\"preprocessor\"")
            .replace("\"tmp\"", "\"classifier\"");
        let paths = write_artifacts(dir.path(), &swapped, r#"{"classes":["a","b"]}"#);
        assert!(matches!(
            Artifacts::load(&paths).unwrap_err(),
            ArtifactError::StageKind { .. }
        ));
    }

    #[test]
    fn width_and_class_count_must_agree() {
        let dir = tempfile::tempdir().unwrap();
        let narrow = PIPELINE_JSON.replace("\"n_features\": 3", "\"n_features\": 2");
        let paths = write_artifacts(dir.path(), &narrow, r#"{"classes":["a","b"]}"#);
        assert!(matches!(
            Artifacts::load(&paths).unwrap_err(),
            ArtifactError::Invalid(_)
        ));

        let paths = write_artifacts(dir.path(), PIPELINE_JSON, r#"{"classes":["a","b","c"]}"#);
        assert!(matches!(
            Artifacts::load(&paths).unwrap_err(),
            ArtifactError::Invalid(_)
        ));
    }
}
