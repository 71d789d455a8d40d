//! Request DTOs for the weather ledger API
//!
//! Query strings arrive as raw text so that each malformed parameter can be
//! reported with its own error code.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::UserId;
use crate::error::{LedgerError, Result};
use crate::history::{
    HistoryFilter, HistoryQuery, HistorySort, Page, DEFAULT_PAGE_LIMIT,
};
use crate::weather::validate_range;

/// Query for `GET /weather/current`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl WeatherQuery {
    /// Parses and range-checks the coordinates.
    pub fn coordinates(&self) -> Result<(f64, f64)> {
        let (Some(lat), Some(lon)) = (non_empty(&self.lat), non_empty(&self.lon)) else {
            return Err(LedgerError::validation(
                "MISSING_COORDINATES",
                "Latitude and longitude are required",
            ));
        };

        let (Ok(lat), Ok(lon)) = (lat.parse::<f64>(), lon.parse::<f64>()) else {
            return Err(LedgerError::validation(
                "INVALID_COORDINATES",
                "Invalid latitude or longitude format",
            ));
        };

        validate_range(lat, lon)?;
        Ok((lat, lon))
    }
}

/// Query for `GET /history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub skip: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    /// `true` asks for the matching total instead of a page
    pub count: Option<String>,
}

/// A validated history request.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryRequest {
    Count(HistoryFilter),
    Page(HistoryQuery),
}

impl HistoryParams {
    /// Validates every parameter and scopes the request to `user_id`.
    pub fn into_request(self, user_id: UserId, max_limit: usize) -> Result<HistoryRequest> {
        let lat = parse_coordinate(&self.lat, -90.0, 90.0, "Latitude must be between -90 and 90")?;
        let lon = parse_coordinate(
            &self.lon,
            -180.0,
            180.0,
            "Longitude must be between -180 and 180",
        )?;
        let filter = HistoryFilter::for_user(user_id)
            .between(
                parse_timestamp(&self.from, "from")?,
                parse_timestamp(&self.to, "to")?,
            )
            .at(lat, lon);

        if non_empty(&self.count) == Some("true") {
            return Ok(HistoryRequest::Count(filter));
        }

        let skip = match non_empty(&self.skip) {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                LedgerError::validation("INVALID_PARAMETER", "Skip must be a non-negative number")
            })?,
            None => 0,
        };
        let limit = match non_empty(&self.limit) {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                LedgerError::validation("INVALID_PARAMETER", "Limit must be a positive number")
            })?,
            None => DEFAULT_PAGE_LIMIT,
        };
        let sort = match non_empty(&self.sort) {
            Some(raw) => raw.parse::<HistorySort>()?,
            None => HistorySort::default(),
        };

        Ok(HistoryRequest::Page(
            HistoryQuery::new(filter)
                .sorted(sort)
                .paged(Page::new(skip, limit, max_limit)),
        ))
    }
}

/// Body for `POST /auth/signout`. Optional; the token's expiry may instead
/// come from the auth gateway's header.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOutRequest {
    pub expires_at: Option<DateTime<Utc>>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_timestamp(value: &Option<String>, name: &str) -> Result<Option<DateTime<Utc>>> {
    non_empty(value)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| {
                    LedgerError::validation("INVALID_DATE", format!("Invalid '{name}' date format"))
                })
        })
        .transpose()
}

fn parse_coordinate(
    value: &Option<String>,
    min: f64,
    max: f64,
    message: &str,
) -> Result<Option<f64>> {
    non_empty(value)
        .map(|raw| match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && (min..=max).contains(&v) => Ok(v),
            _ => Err(LedgerError::validation("INVALID_COORDINATES", message)),
        })
        .transpose()
}
