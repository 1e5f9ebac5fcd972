//! Shipment record and the domains of its ten fields.
//!
//! Every field type can only hold a value inside its declared domain, so a
//! [`ShipmentRecord`] assembled from fields is always valid. Parsing from
//! text (form controls, CLI flags, JSON) is where domains are enforced.

use ontime_model::Row;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Column names the artifacts were fitted on
pub mod columns {
    pub const WEATHER: &str = "Weather_conditions";
    pub const VEHICLE: &str = "Type_of_vehicle";
    pub const CITY: &str = "City";
    pub const FESTIVAL: &str = "Festival";
    pub const TRAFFIC: &str = "Road_traffic_density";
    pub const DRIVER_AGE: &str = "Delivery_person_Age";
    pub const DRIVER_RATING: &str = "Delivery_person_Ratings";
    pub const DISTANCE: &str = "Jarak";
    pub const DELIVERIES: &str = "multiple_deliveries";
    pub const VEHICLE_CONDITION: &str = "Vehicle_condition";
}

/// A value rejected by a field's domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("'{value}' is not a valid {field} (expected one of: {})", .allowed.join(", "))]
    UnknownOption {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },
    #[error("{field} expects {expected}, got '{value}'")]
    NotANumber {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("unknown field '{0}'")]
    UnknownField(String),
}

macro_rules! categorical_field {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const OPTIONS: &'static [&'static str] = &[$($text),+];

            /// Category value as the preprocessor knows it
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        /// The first option, as preselected by the form
        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| FieldError::UnknownOption {
                        field: $field,
                        value: s.to_string(),
                        allowed: Self::OPTIONS,
                    })
            }
        }
    };
}

categorical_field! {
    /// Weather at delivery time
    Weather, "weather" {
        Windy => "Windy",
        Sandstorms => "Sandstorms",
        Cloudy => "Cloudy",
        Sunny => "Sunny",
        Fog => "Fog",
        Stormy => "Stormy",
    }
}

categorical_field! {
    VehicleType, "vehicle" {
        Scooter => "scooter",
        Motorcycle => "motorcycle",
        ElectricScooter => "electric_scooter",
    }
}

categorical_field! {
    CityType, "city" {
        Urban => "Urban",
        SemiUrban => "Semi-Urban",
        Metropolitan => "Metropolitan",
    }
}

categorical_field! {
    /// Whether a festival is running on the delivery day
    Festival, "festival" {
        No => "No",
        Yes => "Yes",
    }
}

categorical_field! {
    TrafficDensity, "traffic" {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Jam => "Jam",
    }
}

impl TrafficDensity {
    pub fn is_congested(self) -> bool {
        matches!(self, TrafficDensity::High | TrafficDensity::Jam)
    }
}

impl Weather {
    pub fn is_severe(self) -> bool {
        matches!(self, Weather::Stormy | Weather::Sandstorms)
    }
}

macro_rules! bounded_field {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty) as $inner_name:literal, $field:literal,
        $min:expr, $max:expr, default $default:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(try_from = $inner_name)]
        pub struct $name($inner);

        impl $name {
            pub const MIN: $inner = $min;
            pub const MAX: $inner = $max;
            pub const DEFAULT: $inner = $default;

            pub fn new(value: $inner) -> Result<Self, FieldError> {
                if (Self::MIN..=Self::MAX).contains(&value) {
                    Ok(Self(value))
                } else {
                    Err(FieldError::OutOfRange {
                        field: $field,
                        value: value.to_string(),
                        min: Self::MIN.to_string(),
                        max: Self::MAX.to_string(),
                    })
                }
            }

            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(Self::DEFAULT)
            }
        }

        impl TryFrom<$inner> for $name {
            type Error = FieldError;

            fn try_from(value: $inner) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! integer_field {
    ($(#[$meta:meta])* $name:ident, $field:literal, $min:expr, $max:expr, default $default:expr) => {
        bounded_field!($(#[$meta])* $name(u8) as "u8", $field, $min, $max, default $default);

        impl FromStr for $name {
            type Err = FieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let value: i64 = s.parse().map_err(|_| FieldError::NotANumber {
                    field: $field,
                    value: s.to_string(),
                    expected: "a whole number",
                })?;
                let narrowed = u8::try_from(value).map_err(|_| FieldError::OutOfRange {
                    field: $field,
                    value: value.to_string(),
                    min: Self::MIN.to_string(),
                    max: Self::MAX.to_string(),
                })?;
                Self::new(narrowed)
            }
        }
    };
}

macro_rules! float_field {
    ($(#[$meta:meta])* $name:ident, $field:literal, $min:expr, $max:expr, default $default:expr) => {
        bounded_field!($(#[$meta])* $name(f64) as "f64", $field, $min, $max, default $default);

        impl FromStr for $name {
            type Err = FieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let value: f64 = s.parse().map_err(|_| FieldError::NotANumber {
                    field: $field,
                    value: s.to_string(),
                    expected: "a number",
                })?;
                Self::new(value)
            }
        }
    };
}

integer_field!(
    /// Driver age in years
    DriverAge, "age", 20, 40, default 25
);
float_field!(
    /// Driver rating on a 1–5 scale
    DriverRating, "rating", 1.0, 5.0, default 4.0
);
float_field!(
    /// Delivery distance in kilometres
    DistanceKm, "distance", 0.1, 30.0, default 5.0
);
integer_field!(
    /// Deliveries the driver carries at the same time
    ConcurrentDeliveries, "deliveries", 0, 5, default 0
);
integer_field!(
    /// Vehicle condition score, 0 (worst) to 2 (best)
    VehicleCondition, "condition", 0, 2, default 1
);

/// One shipment as submitted through the form
///
/// Fields missing from a JSON record take the form defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShipmentRecord {
    #[serde(rename = "Weather_conditions")]
    pub weather: Weather,
    #[serde(rename = "Type_of_vehicle")]
    pub vehicle: VehicleType,
    #[serde(rename = "City")]
    pub city: CityType,
    #[serde(rename = "Festival")]
    pub festival: Festival,
    #[serde(rename = "Road_traffic_density")]
    pub traffic: TrafficDensity,
    #[serde(rename = "Delivery_person_Age")]
    pub driver_age: DriverAge,
    #[serde(rename = "Delivery_person_Ratings")]
    pub driver_rating: DriverRating,
    #[serde(rename = "Jarak")]
    pub distance_km: DistanceKm,
    #[serde(rename = "multiple_deliveries")]
    pub deliveries: ConcurrentDeliveries,
    #[serde(rename = "Vehicle_condition")]
    pub vehicle_condition: VehicleCondition,
}

impl ShipmentRecord {
    /// The record as one input row for the preprocessor
    pub fn to_row(&self) -> Row {
        Row::new()
            .with_category(columns::WEATHER, self.weather.as_str())
            .with_category(columns::VEHICLE, self.vehicle.as_str())
            .with_category(columns::CITY, self.city.as_str())
            .with_category(columns::FESTIVAL, self.festival.as_str())
            .with_category(columns::TRAFFIC, self.traffic.as_str())
            .with_number(columns::DRIVER_AGE, f64::from(self.driver_age.get()))
            .with_number(columns::DRIVER_RATING, self.driver_rating.get())
            .with_number(columns::DISTANCE, self.distance_km.get())
            .with_number(columns::DELIVERIES, f64::from(self.deliveries.get()))
            .with_number(
                columns::VEHICLE_CONDITION,
                f64::from(self.vehicle_condition.get()),
            )
    }
}

/// Identifies one input control of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Weather,
    Vehicle,
    City,
    Festival,
    Traffic,
    DriverAge,
    DriverRating,
    Distance,
    Deliveries,
    VehicleCondition,
}

impl FieldKey {
    pub const ALL: [FieldKey; 10] = [
        FieldKey::Weather,
        FieldKey::Vehicle,
        FieldKey::City,
        FieldKey::Festival,
        FieldKey::Traffic,
        FieldKey::DriverAge,
        FieldKey::DriverRating,
        FieldKey::Distance,
        FieldKey::Deliveries,
        FieldKey::VehicleCondition,
    ];

    /// Short name used on the command line and in the form session
    pub fn key(self) -> &'static str {
        match self {
            FieldKey::Weather => "weather",
            FieldKey::Vehicle => "vehicle",
            FieldKey::City => "city",
            FieldKey::Festival => "festival",
            FieldKey::Traffic => "traffic",
            FieldKey::DriverAge => "age",
            FieldKey::DriverRating => "rating",
            FieldKey::Distance => "distance",
            FieldKey::Deliveries => "deliveries",
            FieldKey::VehicleCondition => "condition",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            FieldKey::Weather => columns::WEATHER,
            FieldKey::Vehicle => columns::VEHICLE,
            FieldKey::City => columns::CITY,
            FieldKey::Festival => columns::FESTIVAL,
            FieldKey::Traffic => columns::TRAFFIC,
            FieldKey::DriverAge => columns::DRIVER_AGE,
            FieldKey::DriverRating => columns::DRIVER_RATING,
            FieldKey::Distance => columns::DISTANCE,
            FieldKey::Deliveries => columns::DELIVERIES,
            FieldKey::VehicleCondition => columns::VEHICLE_CONDITION,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldKey::Weather => "Weather",
            FieldKey::Vehicle => "Vehicle",
            FieldKey::City => "City",
            FieldKey::Festival => "Festival",
            FieldKey::Traffic => "Traffic density",
            FieldKey::DriverAge => "Driver age",
            FieldKey::DriverRating => "Driver rating",
            FieldKey::Distance => "Distance (km)",
            FieldKey::Deliveries => "Multiple deliveries",
            FieldKey::VehicleCondition => "Vehicle condition (0-2)",
        }
    }

    /// Human-readable domain, e.g. `20..=40` or `Low | Medium | High | Jam`
    pub fn domain(self) -> String {
        fn range<T: fmt::Display>(min: T, max: T) -> String {
            format!("{min}..={max}")
        }
        match self {
            FieldKey::Weather => Weather::OPTIONS.join(" | "),
            FieldKey::Vehicle => VehicleType::OPTIONS.join(" | "),
            FieldKey::City => CityType::OPTIONS.join(" | "),
            FieldKey::Festival => Festival::OPTIONS.join(" | "),
            FieldKey::Traffic => TrafficDensity::OPTIONS.join(" | "),
            FieldKey::DriverAge => range(DriverAge::MIN, DriverAge::MAX),
            FieldKey::DriverRating => range(DriverRating::MIN, DriverRating::MAX),
            FieldKey::Distance => range(DistanceKm::MIN, DistanceKm::MAX),
            FieldKey::Deliveries => range(ConcurrentDeliveries::MIN, ConcurrentDeliveries::MAX),
            FieldKey::VehicleCondition => range(VehicleCondition::MIN, VehicleCondition::MAX),
        }
    }

    /// Current value of this field in `record`, as text
    pub fn value_of(self, record: &ShipmentRecord) -> String {
        match self {
            FieldKey::Weather => record.weather.to_string(),
            FieldKey::Vehicle => record.vehicle.to_string(),
            FieldKey::City => record.city.to_string(),
            FieldKey::Festival => record.festival.to_string(),
            FieldKey::Traffic => record.traffic.to_string(),
            FieldKey::DriverAge => record.driver_age.to_string(),
            FieldKey::DriverRating => record.driver_rating.to_string(),
            FieldKey::Distance => record.distance_km.to_string(),
            FieldKey::Deliveries => record.deliveries.to_string(),
            FieldKey::VehicleCondition => record.vehicle_condition.to_string(),
        }
    }
}

impl FromStr for FieldKey {
    type Err = FieldError;

    /// Accepts the short key or the column name, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.key().eq_ignore_ascii_case(s) || k.column().eq_ignore_ascii_case(s))
            .ok_or_else(|| FieldError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
