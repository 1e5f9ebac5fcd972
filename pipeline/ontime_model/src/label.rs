//! Label decoder: maps encoded class indices back to their names

use crate::error::{ArtifactError, ModelError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LabelClasses")]
pub struct LabelDecoder {
    classes: Vec<String>,
}

#[derive(Deserialize)]
struct LabelClasses {
    classes: Vec<String>,
}

impl TryFrom<LabelClasses> for LabelDecoder {
    type Error = ArtifactError;

    fn try_from(raw: LabelClasses) -> Result<Self, Self::Error> {
        Self::new(raw.classes)
    }
}

impl LabelDecoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.len() < 2 {
            return Err(ArtifactError::Invalid(format!(
                "label decoder needs at least two classes, got {}",
                classes.len()
            )));
        }
        let unique: HashSet<&str> = classes.iter().map(String::as_str).collect();
        if unique.len() != classes.len() {
            return Err(ArtifactError::Invalid(
                "label decoder has duplicate classes".into(),
            ));
        }
        if classes.iter().any(|c| c.trim().is_empty()) {
            return Err(ArtifactError::Invalid(
                "label decoder has an empty class name".into(),
            ));
        }
        Ok(Self { classes })
    }

    pub fn inverse_transform(&self, index: usize) -> Result<&str, ModelError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(ModelError::ClassOutOfRange {
                index,
                n_classes: self.classes.len(),
            })
    }

    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_indices_only() {
        let dec: LabelDecoder = serde_json::from_str(r#"{"classes":["Late","On Time"]}"#).unwrap();
        assert_eq!(dec.inverse_transform(0).unwrap(), "Late");
        assert_eq!(dec.inverse_transform(1).unwrap(), "On Time");
        assert_eq!(dec.transform("On Time"), Some(1));
        assert_eq!(
            dec.inverse_transform(2).unwrap_err(),
            ModelError::ClassOutOfRange {
                index: 2,
                n_classes: 2
            }
        );
    }

    #[test]
    fn rejects_degenerate_class_lists() {
        assert!(serde_json::from_str::<LabelDecoder>(r#"{"classes":["Late"]}"#).is_err());
        assert!(
            serde_json::from_str::<LabelDecoder>(r#"{"classes":["Late","Late"]}"#).is_err()
        );
        assert!(LabelDecoder::new(vec!["Late".into(), " ".into()]).is_err());
    }
}
