//! Attribution ranking

use crate::error::ExplanationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One feature and the magnitude of its attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    pub feature: String,
    pub score: f64,
}

/// Pairs names with scores, takes absolute values and sorts descending.
///
/// The sort is stable, so equal scores keep preprocessor output order.
pub fn rank_attributions(
    names: &[String],
    scores: &[f64],
) -> Result<Vec<RankedFeature>, ExplanationError> {
    if names.len() != scores.len() {
        return Err(ExplanationError::ShapeMismatch {
            names: names.len(),
            scores: scores.len(),
        });
    }
    if scores.is_empty() {
        return Err(ExplanationError::NoAttributions);
    }

    let mut ranking: Vec<RankedFeature> = names
        .iter()
        .zip(scores)
        .map(|(name, score)| RankedFeature {
            feature: name.clone(),
            score: score.abs(),
        })
        .collect();
    ranking.sort_by(|a, b| descending(a.score, b.score));
    Ok(ranking)
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorts_by_magnitude() {
        let ranked = rank_attributions(
            &names(&["scaler__Jarak", "onehot__City_Urban", "scaler__Delivery_person_Age"]),
            &[0.1, -0.4, 0.25],
        )
        .unwrap();
        let order: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(
            order,
            vec!["onehot__City_Urban", "scaler__Delivery_person_Age", "scaler__Jarak"]
        );
        assert_eq!(ranked[0].score, 0.4);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank_attributions(&names(&["a", "b", "c"]), &[0.2, -0.2, 0.2]).unwrap();
        let order: Vec<&str> = ranked.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn shape_errors() {
        assert_eq!(
            rank_attributions(&names(&["a", "b"]), &[0.1]).unwrap_err(),
            ExplanationError::ShapeMismatch { names: 2, scores: 1 }
        );
        assert_eq!(
            rank_attributions(&[], &[]).unwrap_err(),
            ExplanationError::NoAttributions
        );
    }
}
