//! OpenWeather current-conditions client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::weather::{CoordinateKey, FetchError, UpstreamFetcher, WeatherPayload};

/// Response `source` for records fetched from OpenWeather.
pub const OPENWEATHER_SOURCE: &str = "openweather";

pub struct OpenWeatherFetcher {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherFetcher {
    /// Builds a client bounded by the configured upstream timeout.
    ///
    /// A missing API key is not an error here: the service still starts and
    /// every cache miss reports `Misconfigured`, so cached data stays usable.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("weather-ledger/", env!("CARGO_PKG_VERSION")))
            .timeout(config.upstream_timeout())
            .build()
            .map_err(|e| FetchError::Misconfigured(format!("HTTP client: {e}")))?;

        if config.openweather_api_key.is_none() {
            warn!("OPENWEATHER_API_KEY is not set; cache misses will fail");
        }

        Ok(Self {
            client,
            base_url: config.openweather_base_url.trim_end_matches('/').to_string(),
            api_key: config.openweather_api_key.clone(),
        })
    }
}

#[async_trait]
impl UpstreamFetcher for OpenWeatherFetcher {
    fn name(&self) -> &str {
        OPENWEATHER_SOURCE
    }

    async fn fetch(&self, key: CoordinateKey) -> Result<WeatherPayload, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::Misconfigured("OpenWeather API key not configured".into()))?;

        let url = format!("{}/weather", self.base_url);
        debug!(%key, "fetching current weather from OpenWeather");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", key.lat().to_string()),
                ("lon", key.lon().to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<WeatherPayload>()
                .await
                .map_err(|e| FetchError::UpstreamError(format!("invalid payload: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() || err.is_connect() {
        FetchError::Unavailable(err.to_string())
    } else {
        FetchError::UpstreamError(err.to_string())
    }
}

/// Maps a non-success status to a fetch failure, preferring the provider's
/// own `message` field for detail.
fn classify_status(status: StatusCode, body: &str) -> FetchError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"));

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::Unavailable(detail)
    } else {
        FetchError::UpstreamError(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, api_key: Option<&str>) -> Config {
        Config {
            openweather_base_url: server.uri(),
            openweather_api_key: api_key.map(str::to_string),
            upstream_timeout_secs: 2,
            ..Config::default()
        }
    }

    fn key() -> CoordinateKey {
        CoordinateKey::normalize(40.7128, -74.006).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_sends_rounded_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "40.71"))
            .and(query_param("lon", "-74.01"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": { "temp": 18.2, "humidity": 63 },
                "weather": [{ "description": "light rain" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = OpenWeatherFetcher::new(&config_for(&server, Some("test-key"))).unwrap();
        let payload = fetcher.fetch(key()).await.unwrap();

        assert_eq!(payload.temperature_celsius(), 18.2);
        assert_eq!(payload.humidity_percent(), 63.0);
        assert_eq!(payload.description(), "light rain");
    }

    #[tokio::test]
    async fn test_fetch_tolerates_null_sections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": { "temp": 4.0, "humidity": 90 },
                "weather": null
            })))
            .mount(&server)
            .await;

        let fetcher = OpenWeatherFetcher::new(&config_for(&server, Some("k"))).unwrap();
        let payload = fetcher.fetch(key()).await.unwrap();

        assert_eq!(payload.temperature_celsius(), 4.0);
        assert_eq!(payload.description(), "No description");
    }

    #[tokio::test]
    async fn test_fetch_without_api_key_is_misconfigured() {
        let server = MockServer::start().await;
        let fetcher = OpenWeatherFetcher::new(&config_for(&server, None)).unwrap();

        let err = fetcher.fetch(key()).await.unwrap_err();
        assert!(matches!(err, FetchError::Misconfigured(_)));
    }

    #[tokio::test]
    async fn test_fetch_503_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = OpenWeatherFetcher::new(&config_for(&server, Some("k"))).unwrap();
        let err = fetcher.fetch(key()).await.unwrap_err();
        assert!(matches!(err, FetchError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_401_carries_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "cod": 401,
                "message": "Invalid API key"
            })))
            .mount(&server)
            .await;

        let fetcher = OpenWeatherFetcher::new(&config_for(&server, Some("bad"))).unwrap();
        let err = fetcher.fetch(key()).await.unwrap_err();
        assert_eq!(err, FetchError::UpstreamError("Invalid API key".into()));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            FetchError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            FetchError::Unavailable(_)
        ));
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, "not json"),
            FetchError::UpstreamError("HTTP 404 Not Found".into())
        );
    }
}
