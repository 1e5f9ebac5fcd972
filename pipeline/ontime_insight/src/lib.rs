//! Delivery performance decisions
//!
//! Turns one [`ShipmentRecord`] into a [`PredictionResult`]: the decoded
//! label and, for late deliveries, the dominant factor behind the prediction
//! and a recommended action.

pub mod error;
pub mod predict;
pub mod ranking;
pub mod recommend;
pub mod record;
pub mod rules;

pub use error::{ExplanationError, InferenceError};
pub use predict::{
    Explanation, ExplanationOutcome, Inference, PredictionContext, PredictionResult,
    DEFAULT_ON_TIME_LABEL,
};
pub use ranking::{rank_attributions, RankedFeature};
pub use recommend::{recommend, Recommendation, RecommendationTopic, GENERIC_ACTION};
pub use record::{
    columns, CityType, ConcurrentDeliveries, DistanceKm, DriverAge, DriverRating, FieldError,
    FieldKey, Festival, ShipmentRecord, TrafficDensity, VehicleCondition, VehicleType, Weather,
};
pub use rules::{
    select_dominant, DominantFactor, OverrideRule, TRAFFIC_CATEGORY, WEATHER_CATEGORY,
};
