use serde::{Deserialize, Serialize};

/// What the recommendation is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTopic {
    Traffic,
    Distance,
    DriverAge,
    DriverRating,
    Weather,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub topic: RecommendationTopic,
    pub action: &'static str,
}

pub const GENERIC_ACTION: &str = "Other factors are at play. Further analysis may be needed.";

/// Which side of the dominant factor a lookup entry is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Category,
    Feature,
}

/// Checked in order; the first entry whose pattern is contained in its
/// subject wins. Only the traffic entry looks at the category, so a weather
/// override is still advised on by the feature the ranking put first.
const LOOKUP: &[(Subject, &str, RecommendationTopic, &str)] = &[
    (
        Subject::Category,
        "Traffic Density",
        RecommendationTopic::Traffic,
        "Suggest an alternate route to avoid congestion.",
    ),
    (
        Subject::Feature,
        "Jarak",
        RecommendationTopic::Distance,
        "Optimize the route or assign a driver located closer to the destination.",
    ),
    (
        Subject::Feature,
        "Delivery_person_Age",
        RecommendationTopic::DriverAge,
        "Provide training or route guidance for this driver.",
    ),
    (
        Subject::Feature,
        "Delivery_person_Ratings",
        RecommendationTopic::DriverRating,
        "Give the driver incentives or feedback to improve performance.",
    ),
    (
        Subject::Feature,
        "Weather_conditions",
        RecommendationTopic::Weather,
        "Warn the driver about the weather and give a more realistic ETA.",
    ),
];

/// Maps a dominant category and the feature behind it to a recommendation;
/// pure and total. Without a feature only the category entries can match.
pub fn recommend(category: &str, feature: Option<&str>) -> Recommendation {
    LOOKUP
        .iter()
        .find(|(subject, pattern, _, _)| match subject {
            Subject::Category => category.contains(pattern),
            Subject::Feature => feature.is_some_and(|f| f.contains(pattern)),
        })
        .map(|&(_, _, topic, action)| Recommendation { topic, action })
        .unwrap_or(Recommendation {
            topic: RecommendationTopic::Unknown,
            action: GENERIC_ACTION,
        })
}
