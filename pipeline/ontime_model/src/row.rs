//! A single named-column input row, the unit the preprocessor transforms

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cell of an input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Category(String),
}

/// A single input record keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number(mut self, column: impl Into<String>, value: f64) -> Self {
        self.cells.insert(column.into(), CellValue::Number(value));
        self
    }

    pub fn with_category(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells
            .insert(column.into(), CellValue::Category(value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overwrites_same_column() {
        let row = Row::new()
            .with_number("Jarak", 3.0)
            .with_number("Jarak", 4.5)
            .with_category("City", "Urban");
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("Jarak"), Some(&CellValue::Number(4.5)));
        assert_eq!(
            row.get("City"),
            Some(&CellValue::Category("Urban".to_string()))
        );
        assert!(row.get("Festival").is_none());
    }
}
