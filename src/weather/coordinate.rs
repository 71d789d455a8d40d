//! Coordinate Key Module
//!
//! Collapses raw coordinates onto a two-decimal grid so that nearby lookups
//! (GPS jitter) share one cache bucket.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

const SCALE: f64 = 100.0;

// == Coordinates ==
/// Plain latitude/longitude pair as exposed in responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

// == Coordinate Key ==
/// Rounded `(lat, lon)` identity of a cached weather record.
///
/// Stored as whole hundredths of a degree so that equality and hashing are
/// exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateKey {
    lat_hundredths: i32,
    lon_hundredths: i32,
}

impl CoordinateKey {
    // == Normalize ==
    /// Rounds each coordinate to two decimals, half away from zero.
    ///
    /// Precondition: `lat` in [-90, 90] and `lon` in [-180, 180]. The web
    /// layer validates this first; the check is repeated here so that no key
    /// is ever built from out-of-range or non-finite input.
    pub fn normalize(lat: f64, lon: f64) -> Result<Self> {
        validate_range(lat, lon)?;
        Ok(Self {
            lat_hundredths: to_hundredths(lat),
            lon_hundredths: to_hundredths(lon),
        })
    }

    pub fn lat(&self) -> f64 {
        self.lat_hundredths as f64 / SCALE
    }

    pub fn lon(&self) -> f64 {
        self.lon_hundredths as f64 / SCALE
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat(),
            lon: self.lon(),
        }
    }
}

impl std::fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.lat(), self.lon())
    }
}

impl Serialize for CoordinateKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.coordinates().serialize(serializer)
    }
}

/// Rounds a single coordinate to the key grid.
pub fn round_coordinate(value: f64) -> f64 {
    to_hundredths(value) as f64 / SCALE
}

fn to_hundredths(value: f64) -> i32 {
    // f64::round rounds half away from zero; |value| <= 180 keeps this in range
    (value * SCALE).round() as i32
}

/// Checks that a coordinate pair is finite and within geographic bounds.
pub fn validate_range(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(LedgerError::validation(
            "INVALID_COORDINATES",
            "Invalid latitude or longitude format",
        ));
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(LedgerError::validation(
            "COORDINATES_OUT_OF_RANGE",
            "Latitude must be between -90 and 90, longitude between -180 and 180",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nearby_coordinates_share_a_key() {
        let a = CoordinateKey::normalize(40.7128, -74.006).unwrap();
        let b = CoordinateKey::normalize(40.71276, -74.00604).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.lat(), 40.71);
        assert_eq!(a.lon(), -74.01);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(round_coordinate(0.125), 0.13);
        assert_eq!(round_coordinate(-0.125), -0.13);
        assert_eq!(round_coordinate(10.004), 10.0);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(CoordinateKey::normalize(90.0, 180.0).is_ok());
        assert!(CoordinateKey::normalize(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = CoordinateKey::normalize(90.01, 0.0).unwrap_err();
        assert_eq!(err.code(), "COORDINATES_OUT_OF_RANGE");

        let err = CoordinateKey::normalize(0.0, -180.5).unwrap_err();
        assert_eq!(err.code(), "COORDINATES_OUT_OF_RANGE");
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = CoordinateKey::normalize(f64::NAN, 0.0).unwrap_err();
        assert_eq!(err.code(), "INVALID_COORDINATES");
        assert!(CoordinateKey::normalize(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_display_and_serialize() {
        let key = CoordinateKey::normalize(51.5074, -0.1278).unwrap();
        assert_eq!(key.to_string(), "(51.51, -0.13)");

        let json = serde_json::to_value(key).unwrap();
        assert_eq!(json, serde_json::json!({ "lat": 51.51, "lon": -0.13 }));
    }

    proptest! {
        // Rounding twice is a no-op.
        #[test]
        fn prop_normalize_idempotent(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let once = CoordinateKey::normalize(lat, lon).unwrap();
            let twice = CoordinateKey::normalize(once.lat(), once.lon()).unwrap();
            prop_assert_eq!(once, twice);
        }

        // The key never moves a coordinate by more than half a grid step.
        #[test]
        fn prop_normalize_stays_close(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let key = CoordinateKey::normalize(lat, lon).unwrap();
            prop_assert!((key.lat() - lat).abs() <= 0.005 + 1e-9);
            prop_assert!((key.lon() - lon).abs() <= 0.005 + 1e-9);
        }
    }
}
