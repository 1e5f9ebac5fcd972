//! Tree ensemble classifier: the `classifier` stage of the pipeline

use crate::error::{ArtifactError, ModelError};
use crate::tree::{DecisionTree, TreeArrays};
use serde::{Deserialize, Serialize};

/// Stage that maps a transformed feature vector to a class index
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    fn n_classes(&self) -> usize;

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Most probable class; the lowest index wins ties
    fn predict(&self, features: &[f64]) -> Result<usize, ModelError> {
        let proba = self.predict_proba(features)?;
        Ok(argmax(&proba))
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnsembleKind {
    /// Mean of per-tree leaf class distributions
    RandomForest,
    /// Binary log-odds: `init_score + learning_rate * sum(leaf)`
    GradientBoosting { learning_rate: f64, init_score: f64 },
}

/// Serialized form of the ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleSpec {
    #[serde(flatten)]
    pub kind: EnsembleKind,
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<TreeArrays>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    kind: EnsembleKind,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl TryFrom<TreeEnsembleSpec> for TreeEnsemble {
    type Error = ArtifactError;

    fn try_from(spec: TreeEnsembleSpec) -> Result<Self, Self::Error> {
        if spec.n_classes < 2 {
            return Err(ArtifactError::Invalid(format!(
                "classifier needs at least two classes, got {}",
                spec.n_classes
            )));
        }
        if spec.trees.is_empty() {
            return Err(ArtifactError::Invalid("ensemble has no trees".into()));
        }
        let n_values = match spec.kind {
            EnsembleKind::RandomForest => spec.n_classes,
            EnsembleKind::GradientBoosting {
                learning_rate,
                init_score,
            } => {
                if spec.n_classes != 2 {
                    return Err(ArtifactError::Invalid(
                        "gradient boosting supports binary classification only".into(),
                    ));
                }
                if !(learning_rate.is_finite() && learning_rate > 0.0) || !init_score.is_finite()
                {
                    return Err(ArtifactError::Invalid(
                        "gradient boosting needs a positive learning rate and finite init score"
                            .into(),
                    ));
                }
                1
            }
        };

        let mut trees = Vec::with_capacity(spec.trees.len());
        for (i, arrays) in spec.trees.into_iter().enumerate() {
            let mut tree = DecisionTree::from_arrays(arrays, spec.n_features, n_values)
                .map_err(|e| ArtifactError::Invalid(format!("tree {i}: {e}")))?;
            if spec.kind == EnsembleKind::RandomForest {
                tree.normalize_values();
            }
            trees.push(tree);
        }

        Ok(Self {
            kind: spec.kind,
            n_features: spec.n_features,
            n_classes: spec.n_classes,
            trees,
        })
    }
}

impl TreeEnsemble {
    pub fn kind(&self) -> EnsembleKind {
        self.kind
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub(crate) fn check_width(&self, features: &[f64]) -> Result<(), ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureCount {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        if let Some(i) = features.iter().position(|x| !x.is_finite()) {
            return Err(ModelError::NonFinite(format!("feature[{i}]")));
        }
        Ok(())
    }

    /// Raw log-odds of class 1; only meaningful for gradient boosting
    pub fn decision_function(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.check_width(features)?;
        let (learning_rate, init_score) = match self.kind {
            EnsembleKind::GradientBoosting {
                learning_rate,
                init_score,
            } => (learning_rate, init_score),
            EnsembleKind::RandomForest => (1.0, 0.0),
        };
        let sum: f64 = self.trees.iter().map(|t| t.leaf_value(features)[0]).sum();
        Ok(init_score + learning_rate * sum)
    }
}

impl Classifier for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.check_width(features)?;
        match self.kind {
            EnsembleKind::RandomForest => {
                let mut proba = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    for (p, v) in proba.iter_mut().zip(tree.leaf_value(features)) {
                        *p += v;
                    }
                }
                let n = self.trees.len() as f64;
                proba.iter_mut().for_each(|p| *p /= n);
                Ok(proba)
            }
            EnsembleKind::GradientBoosting { .. } => {
                let p1 = sigmoid(self.decision_function(features)?);
                Ok(vec![1.0 - p1, p1])
            }
        }
    }
}
