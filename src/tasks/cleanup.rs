//! Retention Cleanup Task
//!
//! Background task that periodically drops weather records past their
//! retention ceiling and revocations whose token has expired. Reads already
//! ignore such entries; this only reclaims memory.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::RevocationStore;
use crate::weather::WeatherCacheStore;

/// Counts removed by one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub weather_records: usize,
    pub revoked_tokens: usize,
}

/// Runs a single cleanup pass at the current time.
///
/// A failing store is logged and skipped so the other store is still purged.
pub async fn run_cleanup(
    weather: &dyn WeatherCacheStore,
    revocations: &dyn RevocationStore,
) -> CleanupReport {
    let now = Utc::now();
    let mut report = CleanupReport::default();

    match weather.purge_expired(now).await {
        Ok(removed) => report.weather_records = removed,
        Err(err) => warn!(error = %err, "weather cache cleanup failed"),
    }
    match revocations.purge_expired(now).await {
        Ok(removed) => report.revoked_tokens = removed,
        Err(err) => warn!(error = %err, "revocation cleanup failed"),
    }

    report
}

/// Spawns a background task that periodically runs [`run_cleanup`].
///
/// The returned handle can be used to abort the task during graceful
/// shutdown.
pub fn spawn_cleanup_task(
    weather: Arc<dyn WeatherCacheStore>,
    revocations: Arc<dyn RevocationStore>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting retention cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = run_cleanup(weather.as_ref(), revocations.as_ref()).await;
            if report.weather_records > 0 || report.revoked_tokens > 0 {
                info!(
                    weather_records = report.weather_records,
                    revoked_tokens = report.revoked_tokens,
                    "retention cleanup removed expired entries"
                );
            } else {
                debug!("retention cleanup: nothing to remove");
            }
        }
    })
}
