// ── Geolocation collaborator ──
//
// Optional source of the user's position. A failure here is a warning for
// the host to show; it never touches markers or mode.

use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::GeolocationError;
use crate::model::GeoPoint;

/// Request options, mirroring the browser geolocation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Accept a cached fix up to this old.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_secs(5),
            maximum_age: Duration::from_secs(60),
        }
    }
}

/// Provides the current position.
pub trait Geolocator: Send + Sync {
    fn current_position(&self, options: GeolocationOptions) -> BoxFuture<'_, Result<GeoPoint, GeolocationError>>;
}

/// Always answers with the same outcome. Used by the CLI's `--here` flag and
/// by tests.
#[derive(Debug, Clone)]
pub struct StaticGeolocator {
    outcome: Result<GeoPoint, GeolocationError>,
}

impl StaticGeolocator {
    pub fn at(position: GeoPoint) -> Self {
        Self { outcome: Ok(position) }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self { outcome: Err(error) }
    }
}

impl Geolocator for StaticGeolocator {
    fn current_position(&self, _options: GeolocationOptions) -> BoxFuture<'_, Result<GeoPoint, GeolocationError>> {
        future::ready(self.outcome.clone()).boxed()
    }
}

/// Ask `locator` for a fix, giving up after `options.timeout`.
pub async fn locate(locator: &dyn Geolocator, options: GeolocationOptions) -> Result<GeoPoint, GeolocationError> {
    tokio::time::timeout(options.timeout, locator.current_position(options))
        .await
        .unwrap_or_else(|_| {
            Err(GeolocationError::Timeout {
                timeout_ms: u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX),
            })
        })
}
