//! API Module
//!
//! HTTP handlers and routing for the weather ledger REST API.
//!
//! # Endpoints
//! - `GET /weather/current` - Current weather for a coordinate pair
//! - `GET /history` - Paginated lookup history of the caller
//! - `POST /auth/signout` - Revoke the caller's token
//! - `GET /stats` - Weather cache statistics
//! - `GET /health` - Health check endpoint
//!
//! Every endpoint is rate limited per client.

pub mod extract;
pub mod handlers;
pub mod rate_limit;
pub mod routes;

pub use extract::AuthenticatedUser;
pub use handlers::*;
pub use rate_limit::{enforce_rate_limit, RequestRateLimiter};
pub use routes::create_router;
