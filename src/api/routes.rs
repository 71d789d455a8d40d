//! API Routes
//!
//! Configures the Axum router with all weather ledger endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    current_weather_handler, health_handler, history_handler, signout_handler, stats_handler,
    AppState,
};
use super::rate_limit::enforce_rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /weather/current?lat&lon` - Current conditions, cached
/// - `GET /history` - The caller's lookup history
/// - `POST /auth/signout` - Revoke the presented token
/// - `GET /stats` - Weather cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Rate limit: per-client quota, 429 `RATE_LIMIT_EXCEEDED` when exceeded
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/weather/current", get(current_weather_handler))
        .route("/history", get(history_handler))
        .route("/auth/signout", post(signout_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            enforce_rate_limit,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
