//! Weather payload as returned by the upstream provider.
//!
//! Only the fields the service reads are typed; everything else is kept
//! verbatim so the stored document stays complete.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Shown when the provider gives no condition text.
pub const NO_DESCRIPTION: &str = "No description";

/// Raw current-conditions document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<PayloadCoord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<MainReadings>,
    /// Absent and explicit `null` both read as empty
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub weather: Vec<Condition>,
    /// Remaining provider fields, untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PayloadCoord {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl WeatherPayload {
    /// Temperature in Celsius, `0.0` when absent.
    pub fn temperature_celsius(&self) -> f64 {
        self.main.as_ref().and_then(|m| m.temp).unwrap_or(0.0)
    }

    /// Relative humidity in percent, `0.0` when absent.
    pub fn humidity_percent(&self) -> f64 {
        self.main.as_ref().and_then(|m| m.humidity).unwrap_or(0.0)
    }

    /// First condition description, or [`NO_DESCRIPTION`].
    pub fn description(&self) -> String {
        self.weather
            .first()
            .and_then(|c| c.description.as_deref())
            .filter(|d| !d.is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_string()
    }

    /// Test and fixture helper building a minimal document.
    pub fn from_readings(temp: f64, humidity: f64, description: &str) -> Self {
        Self {
            main: Some(MainReadings {
                temp: Some(temp),
                humidity: Some(humidity),
                ..Default::default()
            }),
            weather: vec![Condition {
                description: Some(description.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}
