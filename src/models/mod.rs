//! Request and Response models for the weather ledger API
//!
//! DTOs for query strings and JSON bodies at the HTTP edge.

pub mod requests;
pub mod responses;

pub use requests::{HistoryParams, HistoryRequest, SignOutRequest, WeatherQuery};
pub use responses::{
    ApiResponse, CountResponse, HealthResponse, SignOutResponse, StatsResponse,
};
