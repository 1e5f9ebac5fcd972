//! Column transformer: the `preprocessor` stage of the pipeline
//!
//! Mirrors the layout of a fitted column transformer: an ordered list of
//! named transformers, each owning a set of input columns. Outputs are
//! concatenated in declaration order and named `<transformer>__<column>`
//! (one-hot outputs append `_<category>`). Columns not claimed by any
//! transformer are dropped.

use crate::error::{ArtifactError, ModelError};
use crate::row::{CellValue, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Separator between the transformer name and the feature it produced
pub const STAGE_SEPARATOR: &str = "__";

/// Stage that turns one named row into a dense feature vector
pub trait Preprocessor: Send + Sync {
    fn transform(&self, row: &Row) -> Result<Vec<f64>, ModelError>;

    /// Output feature names, aligned with [`Preprocessor::transform`]
    fn feature_names_out(&self) -> Vec<String>;
}

/// What a one-hot encoder does with a category it was not fitted on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformerKind {
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    OneHot {
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough {
        columns: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformer {
    pub name: String,
    #[serde(flatten)]
    pub kind: TransformerKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub transformers: Vec<Transformer>,
}

impl ColumnTransformer {
    pub fn new(transformers: Vec<Transformer>) -> Result<Self, ArtifactError> {
        let ct = Self { transformers };
        ct.validate()?;
        Ok(ct)
    }

    /// Check the fitted parameters are internally consistent
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.transformers.is_empty() {
            return Err(ArtifactError::Invalid(
                "column transformer has no transformers".into(),
            ));
        }
        let mut names = HashSet::new();
        for t in &self.transformers {
            if t.name.is_empty() || t.name.contains(STAGE_SEPARATOR) {
                return Err(ArtifactError::Invalid(format!(
                    "invalid transformer name '{}'",
                    t.name
                )));
            }
            if !names.insert(t.name.as_str()) {
                return Err(ArtifactError::Invalid(format!(
                    "duplicate transformer name '{}'",
                    t.name
                )));
            }
            match &t.kind {
                TransformerKind::StandardScaler {
                    columns,
                    mean,
                    scale,
                } => {
                    if mean.len() != columns.len() || scale.len() != columns.len() {
                        return Err(ArtifactError::Invalid(format!(
                            "scaler '{}' has {} columns, {} means and {} scales",
                            t.name,
                            columns.len(),
                            mean.len(),
                            scale.len()
                        )));
                    }
                    if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
                        return Err(ArtifactError::Invalid(format!(
                            "scaler '{}' has a zero or non-finite scale for column '{}'",
                            t.name, columns[i]
                        )));
                    }
                    if mean.iter().any(|m| !m.is_finite()) {
                        return Err(ArtifactError::Invalid(format!(
                            "scaler '{}' has a non-finite mean",
                            t.name
                        )));
                    }
                }
                TransformerKind::OneHot {
                    columns,
                    categories,
                    ..
                } => {
                    if categories.len() != columns.len() {
                        return Err(ArtifactError::Invalid(format!(
                            "one-hot '{}' has {} columns but {} category lists",
                            t.name,
                            columns.len(),
                            categories.len()
                        )));
                    }
                    for (column, cats) in columns.iter().zip(categories) {
                        if cats.is_empty() {
                            return Err(ArtifactError::Invalid(format!(
                                "one-hot '{}' has no categories for column '{column}'",
                                t.name
                            )));
                        }
                        let unique: HashSet<&String> = cats.iter().collect();
                        if unique.len() != cats.len() {
                            return Err(ArtifactError::Invalid(format!(
                                "one-hot '{}' repeats a category for column '{column}'",
                                t.name
                            )));
                        }
                    }
                }
                TransformerKind::Passthrough { .. } => {}
            }
        }
        Ok(())
    }

    /// Width of the transformed feature vector
    pub fn n_features_out(&self) -> usize {
        self.transformers
            .iter()
            .map(|t| match &t.kind {
                TransformerKind::StandardScaler { columns, .. }
                | TransformerKind::Passthrough { columns } => columns.len(),
                TransformerKind::OneHot { categories, .. } => {
                    categories.iter().map(Vec::len).sum()
                }
            })
            .sum()
    }
}

fn numeric_cell(row: &Row, column: &str) -> Result<f64, ModelError> {
    match row.get(column) {
        Some(CellValue::Number(x)) if x.is_finite() => Ok(*x),
        Some(CellValue::Number(_)) => Err(ModelError::NonFinite(column.to_string())),
        Some(CellValue::Category(_)) => Err(ModelError::ColumnType {
            column: column.to_string(),
            expected: "numeric",
        }),
        None => Err(ModelError::MissingColumn(column.to_string())),
    }
}

fn category_cell<'a>(row: &'a Row, column: &str) -> Result<&'a str, ModelError> {
    match row.get(column) {
        Some(CellValue::Category(s)) => Ok(s),
        Some(CellValue::Number(_)) => Err(ModelError::ColumnType {
            column: column.to_string(),
            expected: "categorical",
        }),
        None => Err(ModelError::MissingColumn(column.to_string())),
    }
}

impl Preprocessor for ColumnTransformer {
    fn transform(&self, row: &Row) -> Result<Vec<f64>, ModelError> {
        let mut out = Vec::with_capacity(self.n_features_out());
        for t in &self.transformers {
            match &t.kind {
                TransformerKind::StandardScaler {
                    columns,
                    mean,
                    scale,
                } => {
                    for ((column, m), s) in columns.iter().zip(mean).zip(scale) {
                        out.push((numeric_cell(row, column)? - m) / s);
                    }
                }
                TransformerKind::OneHot {
                    columns,
                    categories,
                    handle_unknown,
                } => {
                    for (column, cats) in columns.iter().zip(categories) {
                        let value = category_cell(row, column)?;
                        let hit = cats.iter().position(|c| c == value);
                        if hit.is_none() && *handle_unknown == HandleUnknown::Error {
                            return Err(ModelError::UnknownCategory {
                                column: column.clone(),
                                value: value.to_string(),
                            });
                        }
                        out.extend((0..cats.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
                    }
                }
                TransformerKind::Passthrough { columns } => {
                    for column in columns {
                        out.push(numeric_cell(row, column)?);
                    }
                }
            }
        }
        Ok(out)
    }

    fn feature_names_out(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features_out());
        for t in &self.transformers {
            match &t.kind {
                TransformerKind::StandardScaler { columns, .. }
                | TransformerKind::Passthrough { columns } => {
                    names.extend(
                        columns
                            .iter()
                            .map(|c| format!("{}{STAGE_SEPARATOR}{c}", t.name)),
                    );
                }
                TransformerKind::OneHot {
                    columns,
                    categories,
                    ..
                } => {
                    for (column, cats) in columns.iter().zip(categories) {
                        names.extend(
                            cats.iter()
                                .map(|cat| format!("{}{STAGE_SEPARATOR}{column}_{cat}", t.name)),
                        );
                    }
                }
            }
        }
        names
    }
}

/// Strip the `<transformer>__` prefix from a transformed feature name.
///
/// Only the first separator is consumed; names without one are returned as-is.
pub fn strip_stage_prefix(feature: &str) -> &str {
    feature
        .split_once(STAGE_SEPARATOR)
        .map_or(feature, |(_, rest)| rest)
}
