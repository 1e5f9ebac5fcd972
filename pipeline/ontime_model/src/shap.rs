//! Exact path-dependent TreeSHAP for the tree ensemble.
//!
//! For one input the explainer returns one attribution per transformed
//! feature such that `base_value + sum(values)` equals the model output for
//! the explained class: the class probability for a random forest, the
//! log-odds for gradient boosting. Branch probabilities for features outside
//! the coalition are taken from node covers.
//!
//! The recursion keeps the "unique path" of features seen from the root,
//! together with the fraction of zero (feature unknown) and one (feature
//! known) paths flowing through each, and the permutation weights of every
//! subset size. Revisiting a feature undoes its earlier split before
//! redoing it.

use crate::ensemble::{EnsembleKind, TreeEnsemble};
use crate::error::ModelError;
use crate::tree::{DecisionTree, NodeKind};
use serde::Serialize;
use std::sync::Arc;

/// Per-feature contributions for one input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribution {
    /// Expected model output when no feature is known
    pub base_value: f64,
    pub values: Vec<f64>,
}

impl Attribution {
    /// Model output reconstructed from the attributions
    pub fn output(&self) -> f64 {
        self.base_value + self.values.iter().sum::<f64>()
    }
}

/// Computes feature attributions for a single transformed input
pub trait Explainer: Send + Sync {
    fn shap_values(&self, features: &[f64], class: usize) -> Result<Attribution, ModelError>;
}

/// TreeSHAP explainer bound to a tree ensemble
#[derive(Debug, Clone)]
pub struct TreeExplainer {
    model: Arc<TreeEnsemble>,
}

impl TreeExplainer {
    pub fn new(model: Arc<TreeEnsemble>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &TreeEnsemble {
        &self.model
    }
}

impl Explainer for TreeExplainer {
    fn shap_values(&self, features: &[f64], class: usize) -> Result<Attribution, ModelError> {
        use crate::ensemble::Classifier;

        let model = &*self.model;
        model.check_width(features)?;
        if class >= model.n_classes() {
            return Err(ModelError::ClassOutOfRange {
                index: class,
                n_classes: model.n_classes(),
            });
        }

        let mut values = vec![0.0; model.n_features()];
        let mut base_value = 0.0;
        match model.kind() {
            EnsembleKind::RandomForest => {
                let leaf = |v: &[f64]| v[class];
                for tree in model.trees() {
                    tree_shap(tree, features, &leaf, &mut values);
                    base_value += tree.expected_value(&leaf);
                }
                let n = model.n_trees() as f64;
                values.iter_mut().for_each(|v| *v /= n);
                base_value /= n;
            }
            EnsembleKind::GradientBoosting {
                learning_rate,
                init_score,
            } => {
                // margin is the log-odds of class 1; class 0 is its negation
                let sign = if class == 1 { 1.0 } else { -1.0 };
                let leaf = |v: &[f64]| sign * learning_rate * v[0];
                for tree in model.trees() {
                    tree_shap(tree, features, &leaf, &mut values);
                    base_value += tree.expected_value(&leaf);
                }
                base_value += sign * init_score;
            }
        }

        Ok(Attribution { base_value, values })
    }
}

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// Accumulate the attributions of one tree into `phi`
pub fn tree_shap(
    tree: &DecisionTree,
    features: &[f64],
    leaf: &dyn Fn(&[f64]) -> f64,
    phi: &mut [f64],
) {
    let walk = Walk {
        tree,
        features,
        leaf,
    };
    walk.recurse(phi, 0, Vec::new(), 1.0, 1.0, None);
}

struct Walk<'a> {
    tree: &'a DecisionTree,
    features: &'a [f64],
    leaf: &'a dyn Fn(&[f64]) -> f64,
}

impl Walk<'_> {
    fn recurse(
        &self,
        phi: &mut [f64],
        node_index: usize,
        mut path: Vec<PathElement>,
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        extend_path(&mut path, zero_fraction, one_fraction, feature);
        let node = self.tree.node_at(node_index);

        match node.kind {
            NodeKind::Leaf => {
                let value = (self.leaf)(&node.value);
                for i in 1..path.len() {
                    let el = path[i];
                    if let Some(f) = el.feature {
                        let w = unwound_path_sum(&path, i);
                        phi[f] += w * (el.one_fraction - el.zero_fraction) * value;
                    }
                }
            }
            NodeKind::Split {
                feature: split,
                threshold,
                left,
                right,
            } => {
                let (hot, cold) = if self.features[split] <= threshold {
                    (left, right)
                } else {
                    (right, left)
                };
                let hot_zero = self.tree.node_at(hot).cover / node.cover;
                let cold_zero = self.tree.node_at(cold).cover / node.cover;

                let mut incoming_zero = 1.0;
                let mut incoming_one = 1.0;
                if let Some(k) = path.iter().position(|e| e.feature == Some(split)) {
                    incoming_zero = path[k].zero_fraction;
                    incoming_one = path[k].one_fraction;
                    unwind_path(&mut path, k);
                }

                self.recurse(
                    phi,
                    hot,
                    path.clone(),
                    hot_zero * incoming_zero,
                    incoming_one,
                    Some(split),
                );
                self.recurse(
                    phi,
                    cold,
                    path,
                    cold_zero * incoming_zero,
                    0.0,
                    Some(split),
                );
            }
        }
    }
}

fn extend_path(
    path: &mut Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let PathElement {
        zero_fraction,
        one_fraction,
        ..
    } = path[index];
    let denom = (depth + 1) as f64;
    let mut next_one = path[depth].weight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one * denom / ((i + 1) as f64 * one_fraction);
            next_one = tmp - path[i].weight * zero_fraction * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with element `index` removed
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let PathElement {
        zero_fraction,
        one_fraction,
        ..
    } = path[index];
    let denom = (depth + 1) as f64;
    let mut next_one = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one * denom / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one = path[i].weight - tmp * zero_fraction * (depth - i) as f64 / denom;
        } else {
            total += path[i].weight / zero_fraction / ((depth - i) as f64 / denom);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::{Classifier, TreeEnsembleSpec};
    use crate::tree::tests::stump_arrays;
    use crate::tree::TreeArrays;
    use approx::assert_abs_diff_eq;

    /// f0 <= 0.5 → (f1 <= 0.5 → 0.9 | 0.3), else (f0 <= 0.8 → 0.6 | 0.1)
    ///
    /// Values are P(class 1); f0 is split on twice, f2 never.
    fn two_level_arrays() -> TreeArrays {
        let p = |x: f64| vec![1.0 - x, x];
        TreeArrays {
            children_left: vec![1, 2, -1, -1, 5, -1, -1],
            children_right: vec![4, 3, -1, -1, 6, -1, -1],
            feature: vec![0, 1, -2, -2, 0, -2, -2],
            threshold: vec![0.5, 0.5, -2.0, -2.0, 0.8, -2.0, -2.0],
            value: vec![p(0.39), p(0.5), p(0.9), p(0.3), p(0.225), p(0.6), p(0.1)],
            n_node_samples: vec![100.0, 60.0, 20.0, 40.0, 40.0, 10.0, 30.0],
        }
    }

    fn forest(trees: Vec<TreeArrays>, n_features: usize) -> Arc<TreeEnsemble> {
        Arc::new(
            TreeEnsemble::try_from(TreeEnsembleSpec {
                kind: EnsembleKind::RandomForest,
                n_features,
                n_classes: 2,
                trees,
            })
            .unwrap(),
        )
    }

    #[test]
    fn single_split_gives_whole_deviation_to_split_feature() {
        let explainer = TreeExplainer::new(forest(vec![stump_arrays()], 1));
        let attr = explainer.shap_values(&[0.3], 1).unwrap();
        assert_abs_diff_eq!(attr.base_value, 0.38, epsilon = 1e-12);
        assert_abs_diff_eq!(attr.values[0], 0.8 - 0.38, epsilon = 1e-12);
    }

    #[test]
    fn matches_exact_shapley_values() {
        let explainer = TreeExplainer::new(forest(vec![two_level_arrays()], 3));

        let attr = explainer.shap_values(&[0.3, 0.2, 7.0], 1).unwrap();
        assert_abs_diff_eq!(attr.base_value, 0.39, epsilon = 1e-12);
        assert_abs_diff_eq!(attr.values[0], 0.19, epsilon = 1e-12);
        assert_abs_diff_eq!(attr.values[1], 0.32, epsilon = 1e-12);
        assert_abs_diff_eq!(attr.values[2], 0.0);

        // revisits f0 on the right branch
        let attr = explainer.shap_values(&[0.9, 0.7, -1.0], 1).unwrap();
        assert_abs_diff_eq!(attr.values[0], -0.23, epsilon = 1e-12);
        assert_abs_diff_eq!(attr.values[1], -0.06, epsilon = 1e-12);
        assert_abs_diff_eq!(attr.values[2], 0.0);
    }

    #[test]
    fn forest_attributions_are_locally_accurate() {
        let model = forest(vec![two_level_arrays(), stump_arrays_wide()], 3);
        let explainer = TreeExplainer::new(Arc::clone(&model));
        for x in [
            [0.3, 0.2, 0.0],
            [0.9, 0.7, 1.0],
            [0.6, 0.1, 0.4],
            [0.5, 0.5, 0.5],
        ] {
            let proba = model.predict_proba(&x).unwrap();
            for class in 0..2 {
                let attr = explainer.shap_values(&x, class).unwrap();
                assert_abs_diff_eq!(attr.output(), proba[class], epsilon = 1e-9);
            }
        }
    }

    /// Stump on the third feature of a three-feature input
    fn stump_arrays_wide() -> TreeArrays {
        let mut arrays = stump_arrays();
        arrays.feature[0] = 2;
        arrays
    }

    #[test]
    fn boosting_attributions_sum_to_margin() {
        let mut arrays = two_level_arrays();
        arrays.value = arrays.value.iter().map(|v| vec![v[1] - 0.5]).collect();
        let model = Arc::new(
            TreeEnsemble::try_from(TreeEnsembleSpec {
                kind: EnsembleKind::GradientBoosting {
                    learning_rate: 0.3,
                    init_score: -0.2,
                },
                n_features: 3,
                n_classes: 2,
                trees: vec![arrays, two_level_arrays_margin()],
            })
            .unwrap(),
        );
        let explainer = TreeExplainer::new(Arc::clone(&model));
        let x = [0.9, 0.7, 0.0];
        let margin = model.decision_function(&x).unwrap();
        let late = explainer.shap_values(&x, 1).unwrap();
        assert_abs_diff_eq!(late.output(), margin, epsilon = 1e-9);
        let on_time = explainer.shap_values(&x, 0).unwrap();
        assert_abs_diff_eq!(on_time.output(), -margin, epsilon = 1e-9);
        for (a, b) in late.values.iter().zip(&on_time.values) {
            assert_abs_diff_eq!(*a, -*b, epsilon = 1e-12);
        }
    }

    fn two_level_arrays_margin() -> TreeArrays {
        let mut arrays = stump_arrays_wide();
        arrays.value = vec![vec![0.0], vec![1.5], vec![-0.5]];
        arrays
    }

    #[test]
    fn rejects_bad_width_and_class() {
        let explainer = TreeExplainer::new(forest(vec![stump_arrays()], 1));
        assert!(matches!(
            explainer.shap_values(&[0.1, 0.2], 0),
            Err(ModelError::FeatureCount { .. })
        ));
        assert!(matches!(
            explainer.shap_values(&[0.1], 2),
            Err(ModelError::ClassOutOfRange { .. })
        ));
    }
}
