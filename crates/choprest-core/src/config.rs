// ── Runtime configuration ──
//
// These types describe how to bring up the map and where to fetch
// restaurants from. They carry the provider key and tuning knobs but never
// touch disk: `choprest-config` (or a test) builds them and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::geolocation::GeolocationOptions;
use crate::model::GeoPoint;

/// Default SDK script location. The loader appends `appkey` and `autoload`.
pub const DEFAULT_SCRIPT_URL: &str = "https://dapi.kakao.com/v2/maps/sdk.js";

/// Bounded readiness polling for the SDK's post-load initialization.
///
/// The defaults (100 ms × 100) come from field experience rather than any
/// SDK guarantee; treat them as tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_attempts: 100,
        }
    }
}

/// Zoom levels used by the marker engine. Lower numbers are closer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomLevels {
    /// After a bulk replace: wide enough to see a district.
    pub overview: u8,
    /// After a marker click or a location fix.
    pub focus: u8,
    /// First step of the single-marker zoom, applied right after the pan.
    pub staged_medium: u8,
    /// Second step, applied after `stage_delay`.
    pub staged_tight: u8,
    /// Gap between the two steps. The SDK exposes no pan-finished callback,
    /// so this approximates one.
    pub stage_delay: Duration,
}

impl Default for ZoomLevels {
    fn default() -> Self {
        Self {
            overview: 7,
            focus: 3,
            staged_medium: 5,
            staged_tight: 2,
            stage_delay: Duration::from_millis(300),
        }
    }
}

/// Everything needed to bring up one map session.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// SDK provider (app) key.
    pub provider_key: SecretString,
    /// SDK script URL, without query string.
    pub script_url: Url,
    /// DOM id of the element the map mounts into.
    pub container: String,
    /// Center before any result is rendered.
    pub default_center: GeoPoint,
    /// Zoom before any result is rendered.
    pub default_zoom: u8,
    pub poll: PollConfig,
    pub zoom: ZoomLevels,
    /// Radius used by "find nearby", in meters.
    pub nearby_radius_m: f64,
    pub geolocation: GeolocationOptions,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            provider_key: SecretString::from(String::new()),
            script_url: Url::parse(DEFAULT_SCRIPT_URL).unwrap_or_else(|_| unreachable!()),
            container: "map".into(),
            default_center: GeoPoint::SEOUL_CITY_HALL,
            default_zoom: 7,
            poll: PollConfig::default(),
            zoom: ZoomLevels::default(),
            nearby_radius_m: 1000.0,
            geolocation: GeolocationOptions::default(),
        }
    }
}

/// Where the restaurant catalog lives.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Server root, e.g. `http://localhost:8080`.
    pub base_url: Url,
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8080").unwrap_or_else(|_| unreachable!()),
            timeout: Duration::from_secs(30),
        }
    }
}
