//! Override policy for picking the dominant factor of a late prediction
//!
//! Rules are evaluated top-down and the first one that applies wins. Business
//! overrides on the record take precedence over the attribution ranking.

use crate::ranking::RankedFeature;
use crate::record::{columns, ShipmentRecord};
use ontime_model::strip_stage_prefix;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TRAFFIC_CATEGORY: &str = "Traffic Density";
pub const WEATHER_CATEGORY: &str = "Weather Condition";

/// Below this distance the distance feature is not accepted as the cause
pub const SHORT_DISTANCE_KM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideRule {
    TrafficOverride,
    WeatherOverride,
    DistanceDemotion,
    Default,
}

impl OverrideRule {
    /// Evaluation order
    pub const ORDER: [OverrideRule; 4] = [
        OverrideRule::TrafficOverride,
        OverrideRule::WeatherOverride,
        OverrideRule::DistanceDemotion,
        OverrideRule::Default,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OverrideRule::TrafficOverride => "traffic_override",
            OverrideRule::WeatherOverride => "weather_override",
            OverrideRule::DistanceDemotion => "distance_demotion",
            OverrideRule::Default => "default",
        }
    }

    /// The factor this rule selects, or `None` when it does not apply
    pub fn apply(self, record: &ShipmentRecord, ranking: &[RankedFeature]) -> Option<DominantFactor> {
        match self {
            OverrideRule::TrafficOverride => record
                .traffic
                .is_congested()
                .then(|| DominantFactor::overriding(self, TRAFFIC_CATEGORY, ranking)),
            OverrideRule::WeatherOverride => record
                .weather
                .is_severe()
                .then(|| DominantFactor::overriding(self, WEATHER_CATEGORY, ranking)),
            OverrideRule::DistanceDemotion => {
                let top = ranking.first()?;
                if !is_distance_feature(&top.feature)
                    || record.distance_km.get() >= SHORT_DISTANCE_KM
                {
                    return None;
                }
                // one level only: the runner-up is taken as is
                let chosen = ranking.get(1).unwrap_or(top);
                Some(DominantFactor::from_feature(self, &chosen.feature))
            }
            OverrideRule::Default => ranking
                .first()
                .map(|top| DominantFactor::from_feature(self, &top.feature)),
        }
    }
}

impl fmt::Display for OverrideRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The factor presented as the main trigger of a late prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominantFactor {
    pub rule: OverrideRule,
    pub category: String,
    /// Transformed feature behind the factor. Overrides keep the top-ranked
    /// feature here; `None` only when the ranking was empty.
    pub feature: Option<String>,
}

impl DominantFactor {
    fn overriding(rule: OverrideRule, category: &str, ranking: &[RankedFeature]) -> Self {
        Self {
            rule,
            category: category.to_string(),
            feature: ranking.first().map(|top| top.feature.clone()),
        }
    }

    fn from_feature(rule: OverrideRule, feature: &str) -> Self {
        Self {
            rule,
            category: strip_stage_prefix(feature).to_string(),
            feature: Some(feature.to_string()),
        }
    }
}

/// The distance column itself, after the stage prefix is stripped. Derived
/// names such as `scaler__Jarak_squared` do not count, unlike a plain
/// substring test on `scaler__Jarak`.
pub fn is_distance_feature(feature: &str) -> bool {
    strip_stage_prefix(feature) == columns::DISTANCE
}

/// Runs the rules in order; `None` only when no override fires and the
/// ranking is empty.
pub fn select_dominant(record: &ShipmentRecord, ranking: &[RankedFeature]) -> Option<DominantFactor> {
    OverrideRule::ORDER
        .iter()
        .find_map(|rule| rule.apply(record, ranking))
}
