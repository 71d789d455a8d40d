//! Weather Module
//!
//! Coordinate normalization, the weather cache, the upstream provider seam
//! and the lookup flow that ties them together.

mod cache;
mod coordinate;
mod fetcher;
mod openweather;
mod orchestrator;
mod payload;

pub use cache::{InMemoryWeatherCache, WeatherCacheStore, WeatherRecord};
pub use coordinate::{round_coordinate, validate_range, CoordinateKey, Coordinates};
pub use fetcher::{FetchError, UpstreamFetcher};
pub use openweather::{OpenWeatherFetcher, OPENWEATHER_SOURCE};
pub use orchestrator::{LookupOrchestrator, WeatherResponse, WeatherSource, CACHE_SOURCE};
pub use payload::{Condition, MainReadings, PayloadCoord, WeatherPayload, NO_DESCRIPTION};
