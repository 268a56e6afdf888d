// ── Geographic position ──

use serde::Serialize;
use std::fmt;

/// A validated WGS84 coordinate.
///
/// Construction goes through [`GeoPoint::new`], which rejects non-finite and
/// out-of-range values, so any `GeoPoint` in hand is safe to render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Seoul City Hall, the map's resting center before any result loads.
    pub const SEOUL_CITY_HALL: Self = Self {
        lat: 37.5665,
        lng: 126.9780,
    };

    /// Validate and build a point. Returns `None` for NaN, infinities, or
    /// anything outside ±90° latitude / ±180° longitude.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }

    /// Build from a pair of optional coordinates, as they arrive off the wire.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        Self::new(lat?, lng?)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}
