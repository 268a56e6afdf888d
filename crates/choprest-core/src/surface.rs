// ── Map surface ──
//
// One viewport bound to one container. Thin over the SDK: it owns the map id
// and keeps zoom inside the provider's range.

use std::sync::Arc;

use tracing::debug;

use crate::error::MapError;
use crate::loader::MapHandle;
use crate::model::GeoPoint;
use crate::sdk::{MapId, MapSdk};

/// Closest zoom level the provider supports.
pub const MIN_ZOOM: u8 = 1;
/// Widest zoom level the provider supports.
pub const MAX_ZOOM: u8 = 14;

/// A mounted map viewport.
pub struct MapSurface {
    handle: MapHandle,
    map: MapId,
    container: String,
}

impl MapSurface {
    /// Create the map inside `container`.
    pub fn mount(handle: MapHandle, container: &str, center: GeoPoint, zoom: u8) -> Result<Self, MapError> {
        let zoom = clamp_zoom(zoom);
        let map = handle
            .sdk()
            .create_map(container, center, zoom)
            .map_err(|e| MapError::Mount {
                container: container.to_owned(),
                reason: e.0,
            })?;
        debug!(%map, container, %center, zoom, "map mounted");
        Ok(Self {
            handle,
            map,
            container: container.to_owned(),
        })
    }

    pub fn map_id(&self) -> MapId {
        self.map
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn handle(&self) -> &MapHandle {
        &self.handle
    }

    pub(crate) fn sdk(&self) -> &Arc<dyn MapSdk> {
        self.handle.sdk()
    }

    /// Current center. Falls back to Seoul City Hall if the SDK lost the map.
    pub fn center(&self) -> GeoPoint {
        self.sdk().center(self.map).unwrap_or(GeoPoint::SEOUL_CITY_HALL)
    }

    pub fn zoom(&self) -> u8 {
        self.sdk().zoom(self.map).unwrap_or(MAX_ZOOM)
    }

    pub fn set_center(&self, center: GeoPoint) {
        self.sdk().set_center(self.map, center);
    }

    /// Animated recenter.
    pub fn pan_to(&self, center: GeoPoint) {
        self.sdk().pan_to(self.map, center);
    }

    /// Set zoom, clamped to the supported range. Returns the level applied.
    pub fn set_zoom(&self, level: u8) -> u8 {
        let level = clamp_zoom(level);
        self.sdk().set_zoom(self.map, level);
        level
    }

    /// Recenter and zoom in one step.
    pub fn focus(&self, center: GeoPoint, level: u8) {
        self.set_center(center);
        self.set_zoom(level);
    }

    /// One level closer. Lower numbers are closer in.
    pub fn zoom_in(&self) -> u8 {
        self.set_zoom(self.zoom().saturating_sub(1))
    }

    /// One level wider.
    pub fn zoom_out(&self) -> u8 {
        self.set_zoom(self.zoom().saturating_add(1))
    }
}

impl std::fmt::Debug for MapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSurface")
            .field("map", &self.map)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

fn clamp_zoom(level: u8) -> u8 {
    level.clamp(MIN_ZOOM, MAX_ZOOM)
}
