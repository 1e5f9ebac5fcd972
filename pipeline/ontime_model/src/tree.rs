//! Array-backed decision tree.
//!
//! Trees are exported as parallel arrays (`children_left`, `children_right`,
//! `feature`, `threshold`, `value`, `n_node_samples`), one entry per node,
//! with leaves marked by `-1` children. Loading validates the arrays once so
//! traversal can index without bounds failures: every child index points
//! strictly forward, which also rules out cycles. Every node has at most one
//! parent and no leaf is deeper than [`MAX_TREE_DEPTH`], which bounds the
//! recursion of the tree walks.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};

/// Deepest split chain accepted from an artifact
pub const MAX_TREE_DEPTH: usize = 512;

/// Serialized form of one tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
    /// Training samples that reached each node (a.k.a. cover)
    pub n_node_samples: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Leaf,
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub value: Vec<f64>,
    pub cover: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Build a tree from its exported arrays.
    ///
    /// `n_features` bounds the split feature indices, `n_values` is the
    /// expected width of every `value` row.
    pub fn from_arrays(
        arrays: TreeArrays,
        n_features: usize,
        n_values: usize,
    ) -> Result<Self, ArtifactError> {
        let n = arrays.feature.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("tree has no nodes".into()));
        }
        if arrays.children_left.len() != n
            || arrays.children_right.len() != n
            || arrays.threshold.len() != n
            || arrays.value.len() != n
            || arrays.n_node_samples.len() != n
        {
            return Err(ArtifactError::Invalid("inconsistent tree array lengths".into()));
        }

        let child = |idx: usize, raw: i64| -> Result<usize, ArtifactError> {
            usize::try_from(raw)
                .ok()
                .filter(|&c| c > idx && c < n)
                .ok_or_else(|| {
                    ArtifactError::Invalid(format!("node {idx} has invalid child index {raw}"))
                })
        };

        // parents always precede their children, so one forward pass fills
        // in every node's depth
        let mut depth: Vec<Option<usize>> = vec![None; n];
        depth[0] = Some(0);
        let mut nodes = Vec::with_capacity(n);
        for (i, value) in arrays.value.into_iter().enumerate() {
            let (left, right) = (arrays.children_left[i], arrays.children_right[i]);
            let kind = if left == -1 && right == -1 {
                NodeKind::Leaf
            } else {
                let feature = usize::try_from(arrays.feature[i])
                    .ok()
                    .filter(|&f| f < n_features)
                    .ok_or_else(|| {
                        ArtifactError::Invalid(format!(
                            "node {i} splits on feature {} outside 0..{n_features}",
                            arrays.feature[i]
                        ))
                    })?;
                let threshold = arrays.threshold[i];
                if !threshold.is_finite() {
                    return Err(ArtifactError::Invalid(format!(
                        "node {i} has a non-finite threshold"
                    )));
                }
                let (left, right) = (child(i, left)?, child(i, right)?);
                let child_depth = depth[i].map_or(0, |d| d + 1);
                if child_depth > MAX_TREE_DEPTH {
                    return Err(ArtifactError::Invalid(format!(
                        "tree is deeper than {MAX_TREE_DEPTH} levels at node {i}"
                    )));
                }
                for c in [left, right] {
                    if depth[c].replace(child_depth).is_some() || left == right {
                        return Err(ArtifactError::Invalid(format!(
                            "node {c} has more than one parent"
                        )));
                    }
                }
                NodeKind::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }
            };
            if value.len() != n_values || value.iter().any(|v| !v.is_finite()) {
                return Err(ArtifactError::Invalid(format!(
                    "node {i} value must hold {n_values} finite entries"
                )));
            }
            let cover = arrays.n_node_samples[i];
            if !(cover.is_finite() && cover > 0.0) {
                return Err(ArtifactError::Invalid(format!(
                    "node {i} has non-positive sample count {cover}"
                )));
            }
            nodes.push(TreeNode { kind, value, cover });
        }
        Ok(Self { nodes })
    }

    /// Index of the leaf reached by `features` (`x <= threshold` goes left).
    ///
    /// `features` must be at least as wide as the tree's `n_features`.
    pub fn leaf_index(&self, features: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match self.nodes[idx].kind {
                NodeKind::Leaf => return idx,
                NodeKind::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[feature] <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn leaf_value(&self, features: &[f64]) -> &[f64] {
        &self.nodes[self.leaf_index(features)].value
    }

    /// Cover-weighted mean of `leaf` over all leaves, i.e. the tree output
    /// when no feature is known.
    pub fn expected_value(&self, leaf: &dyn Fn(&[f64]) -> f64) -> f64 {
        self.node_expectation(0, leaf)
    }

    fn node_expectation(&self, idx: usize, leaf: &dyn Fn(&[f64]) -> f64) -> f64 {
        let node = &self.nodes[idx];
        match node.kind {
            NodeKind::Leaf => leaf(&node.value),
            NodeKind::Split { left, right, .. } => {
                let l = &self.nodes[left];
                let r = &self.nodes[right];
                (l.cover * self.node_expectation(left, leaf)
                    + r.cover * self.node_expectation(right, leaf))
                    / node.cover
            }
        }
    }

    /// Normalize every node's value row to sum to one (class counts to
    /// class probabilities). Rows summing to zero are left untouched.
    pub(crate) fn normalize_values(&mut self) {
        for node in &mut self.nodes {
            let total: f64 = node.value.iter().sum();
            if total > 0.0 {
                node.value.iter_mut().for_each(|v| *v /= total);
            }
        }
    }

    pub fn node_at(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }
}
