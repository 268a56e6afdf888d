// ── In-memory SDK ──
//
// A complete `MapSdk` with no rendering. Keeps the same object tables a
// browser SDK would and exposes them for inspection, so the engine can run
// in a terminal and be asserted on in tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::{self, BoxFuture, FutureExt};
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use super::{ClickHandler, MapId, MapSdk, MarkerId, OverlayId, SdkError};
use crate::model::GeoPoint;

#[derive(Debug, Clone, Copy)]
enum Readiness {
    /// Ready before any script is injected.
    Preloaded,
    /// Ready on the nth readiness check after injection.
    AfterChecks(u32),
    Never,
}

/// Snapshot of one live marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    #[serde(skip)]
    pub id: MarkerId,
    pub title: String,
    pub position: GeoPoint,
    #[serde(skip)]
    pub clickable: bool,
}

/// Snapshot of one open info overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayView {
    #[serde(skip)]
    pub id: OverlayId,
    #[serde(skip)]
    pub anchor: MarkerId,
    pub content: String,
}

struct MapState {
    container: String,
    center: GeoPoint,
    zoom: u8,
    zoom_history: Vec<u8>,
    pans: u32,
}

struct MarkerState {
    map: MapId,
    position: GeoPoint,
    title: String,
    handler: Option<ClickHandler>,
}

struct OverlayState {
    content: String,
    open_on: Option<(MapId, MarkerId)>,
}

struct State {
    readiness: Readiness,
    script_failure: Option<String>,
    reject_markers: bool,
    injected: Vec<Url>,
    checks: u32,
    checks_since_injection: u32,
    markers_created: u32,
    maps: HashMap<MapId, MapState>,
    // Ordered so inspection follows creation order.
    markers: BTreeMap<MarkerId, MarkerState>,
    overlays: BTreeMap<OverlayId, OverlayState>,
}

/// A `MapSdk` that keeps everything in memory.
pub struct HeadlessSdk {
    state: Mutex<State>,
    next_id: AtomicU64,
}

impl HeadlessSdk {
    fn with_readiness(readiness: Readiness) -> Self {
        Self {
            state: Mutex::new(State {
                readiness,
                script_failure: None,
                reject_markers: false,
                injected: Vec::new(),
                checks: 0,
                checks_since_injection: 0,
                markers_created: 0,
                maps: HashMap::new(),
                markers: BTreeMap::new(),
                overlays: BTreeMap::new(),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Needs a script injection, then reports ready on the first check.
    pub fn new() -> Self {
        Self::ready_after(1)
    }

    /// Needs a script injection, then reports ready on the `checks`th
    /// readiness check after it. `0` means ready as soon as the script loads.
    pub fn ready_after(checks: u32) -> Self {
        Self::with_readiness(Readiness::AfterChecks(checks))
    }

    /// Loads the script but never finishes initializing.
    pub fn never_ready() -> Self {
        Self::with_readiness(Readiness::Never)
    }

    /// Script injection fails with `reason`.
    pub fn failing_script(reason: impl Into<String>) -> Self {
        let sdk = Self::with_readiness(Readiness::Never);
        sdk.lock().script_failure = Some(reason.into());
        sdk
    }

    /// Already initialized by someone else; no injection needed.
    pub fn preloaded() -> Self {
        Self::with_readiness(Readiness::Preloaded)
    }

    /// Make every subsequent `create_marker` fail.
    pub fn reject_markers(&self, reject: bool) {
        self.lock().reject_markers = reject;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next<T>(&self, wrap: impl FnOnce(u64) -> T) -> T {
        wrap(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Live markers in creation order.
    pub fn markers(&self) -> Vec<MarkerView> {
        self.lock()
            .markers
            .iter()
            .map(|(id, m)| MarkerView {
                id: *id,
                title: m.title.clone(),
                position: m.position,
                clickable: m.handler.is_some(),
            })
            .collect()
    }

    pub fn marker_count(&self) -> usize {
        self.lock().markers.len()
    }

    /// Overlays currently shown on any map.
    pub fn open_overlays(&self) -> Vec<OverlayView> {
        self.lock()
            .overlays
            .iter()
            .filter_map(|(id, o)| {
                o.open_on.map(|(_, anchor)| OverlayView {
                    id: *id,
                    anchor,
                    content: o.content.clone(),
                })
            })
            .collect()
    }

    /// Overlays still held, open or not.
    pub fn overlay_count(&self) -> usize {
        self.lock().overlays.len()
    }

    /// Every zoom level a map has been set to, in order.
    pub fn zoom_history(&self, map: MapId) -> Vec<u8> {
        self.lock()
            .maps
            .get(&map)
            .map(|m| m.zoom_history.clone())
            .unwrap_or_default()
    }

    /// Number of animated pans a map has seen.
    pub fn pan_count(&self, map: MapId) -> u32 {
        self.lock().maps.get(&map).map_or(0, |m| m.pans)
    }

    /// Container a map was mounted into.
    pub fn container(&self, map: MapId) -> Option<String> {
        self.lock().maps.get(&map).map(|m| m.container.clone())
    }

    pub fn map_count(&self) -> usize {
        self.lock().maps.len()
    }

    /// Script URLs injected so far.
    pub fn injected_scripts(&self) -> Vec<Url> {
        self.lock().injected.clone()
    }

    pub fn readiness_checks(&self) -> u32 {
        self.lock().checks
    }

    /// Total `create_marker` successes, including markers since removed.
    pub fn markers_created(&self) -> u32 {
        self.lock().markers_created
    }

    /// Simulate a user click. Returns `false` when the marker is gone or has
    /// no listener. The handler runs with no internal lock held.
    pub fn click(&self, marker: MarkerId) -> bool {
        let handler = self.lock().markers.get(&marker).and_then(|m| m.handler.clone());
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// Click the first live marker whose title matches.
    pub fn click_titled(&self, title: &str) -> bool {
        let id = self
            .lock()
            .markers
            .iter()
            .find(|(_, m)| m.title == title)
            .map(|(id, _)| *id);
        id.is_some_and(|id| self.click(id))
    }
}

impl Default for HeadlessSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSdk for HeadlessSdk {
    fn is_ready(&self) -> bool {
        let mut state = self.lock();
        state.checks += 1;
        match state.readiness {
            Readiness::Preloaded => true,
            Readiness::Never => false,
            Readiness::AfterChecks(_) if state.injected.is_empty() => false,
            Readiness::AfterChecks(n) => {
                state.checks_since_injection += 1;
                state.checks_since_injection >= n
            }
        }
    }

    fn inject_script(&self, url: &Url) -> BoxFuture<'_, Result<(), SdkError>> {
        let mut state = self.lock();
        debug!(%url, "headless script injection");
        let result = match state.script_failure.clone() {
            Some(reason) => Err(SdkError(reason)),
            None => {
                state.injected.push(url.clone());
                if let Readiness::AfterChecks(0) = state.readiness {
                    state.readiness = Readiness::Preloaded;
                }
                Ok(())
            }
        };
        future::ready(result).boxed()
    }

    fn create_map(&self, container: &str, center: GeoPoint, zoom: u8) -> Result<MapId, SdkError> {
        if container.trim().is_empty() {
            return Err(SdkError::new("container id is empty"));
        }
        let id = self.next(MapId::new);
        self.lock().maps.insert(
            id,
            MapState {
                container: container.to_owned(),
                center,
                zoom,
                zoom_history: vec![zoom],
                pans: 0,
            },
        );
        Ok(id)
    }

    fn create_marker(&self, map: MapId, position: GeoPoint, title: &str) -> Result<MarkerId, SdkError> {
        let id = self.next(MarkerId::new);
        let mut state = self.lock();
        if state.reject_markers {
            return Err(SdkError::new("marker creation rejected"));
        }
        if !state.maps.contains_key(&map) {
            return Err(SdkError(format!("unknown {map}")));
        }
        state.markers.insert(
            id,
            MarkerState {
                map,
                position,
                title: title.to_owned(),
                handler: None,
            },
        );
        state.markers_created += 1;
        trace!(%id, %map, "marker created");
        Ok(id)
    }

    fn remove_marker(&self, marker: MarkerId) {
        let mut state = self.lock();
        if let Some(removed) = state.markers.remove(&marker) {
            trace!(%marker, map = %removed.map, "marker removed");
        }
        // An overlay anchored on a removed marker disappears with it.
        state
            .overlays
            .retain(|_, overlay| !overlay.open_on.is_some_and(|(_, anchor)| anchor == marker));
    }

    fn create_info_overlay(&self, content: &str) -> Result<OverlayId, SdkError> {
        let id = self.next(OverlayId::new);
        self.lock().overlays.insert(
            id,
            OverlayState {
                content: content.to_owned(),
                open_on: None,
            },
        );
        Ok(id)
    }

    fn open_overlay(&self, map: MapId, overlay: OverlayId, anchor: MarkerId) {
        let mut state = self.lock();
        if !state.markers.contains_key(&anchor) {
            return;
        }
        if let Some(o) = state.overlays.get_mut(&overlay) {
            o.open_on = Some((map, anchor));
        }
    }

    fn close_overlay(&self, overlay: OverlayId) {
        if self.lock().overlays.remove(&overlay).is_some() {
            trace!(%overlay, "overlay closed");
        }
    }

    fn add_click_listener(&self, marker: MarkerId, handler: ClickHandler) {
        if let Some(m) = self.lock().markers.get_mut(&marker) {
            m.handler = Some(handler);
        }
    }

    fn pan_to(&self, map: MapId, center: GeoPoint) {
        if let Some(m) = self.lock().maps.get_mut(&map) {
            m.center = center;
            m.pans += 1;
        }
    }

    fn set_center(&self, map: MapId, center: GeoPoint) {
        if let Some(m) = self.lock().maps.get_mut(&map) {
            m.center = center;
        }
    }

    fn set_zoom(&self, map: MapId, level: u8) {
        if let Some(m) = self.lock().maps.get_mut(&map) {
            m.zoom = level;
            m.zoom_history.push(level);
        }
    }

    fn center(&self, map: MapId) -> Option<GeoPoint> {
        self.lock().maps.get(&map).map(|m| m.center)
    }

    fn zoom(&self, map: MapId) -> Option<u8> {
        self.lock().maps.get(&map).map(|m| m.zoom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn url() -> Url {
        Url::parse("https://maps.example/sdk.js?appkey=k&autoload=false").unwrap()
    }

    #[tokio::test]
    async fn ready_after_counts_checks_since_injection() {
        let sdk = HeadlessSdk::ready_after(2);
        assert!(!sdk.is_ready());
        sdk.inject_script(&url()).await.unwrap();
        assert!(!sdk.is_ready());
        assert!(sdk.is_ready());
        assert_eq!(sdk.readiness_checks(), 3);
        assert_eq!(sdk.injected_scripts(), vec![url()]);
    }

    #[tokio::test]
    async fn failing_script_records_nothing() {
        let sdk = HeadlessSdk::failing_script("blocked");
        let err = sdk.inject_script(&url()).await.unwrap_err();
        assert_eq!(err, SdkError::new("blocked"));
        assert!(sdk.injected_scripts().is_empty());
        assert!(!sdk.is_ready());
    }

    #[test]
    fn removing_anchor_closes_overlay() {
        let sdk = HeadlessSdk::preloaded();
        let here = GeoPoint::SEOUL_CITY_HALL;
        let map = sdk.create_map("map", here, 7).unwrap();
        let marker = sdk.create_marker(map, here, "a").unwrap();
        let overlay = sdk.create_info_overlay("<p>a</p>").unwrap();
        sdk.open_overlay(map, overlay, marker);
        assert_eq!(sdk.open_overlays().len(), 1);

        sdk.remove_marker(marker);
        assert!(sdk.open_overlays().is_empty());
        assert_eq!(sdk.overlay_count(), 0);
        assert_eq!(sdk.marker_count(), 0);
        assert_eq!(sdk.markers_created(), 1);
    }

    #[test]
    fn closed_overlays_are_dropped() {
        let sdk = HeadlessSdk::preloaded();
        let here = GeoPoint::SEOUL_CITY_HALL;
        let map = sdk.create_map("map", here, 7).unwrap();
        let marker = sdk.create_marker(map, here, "a").unwrap();
        let idle = sdk.create_info_overlay("<p>idle</p>").unwrap();
        let shown = sdk.create_info_overlay("<p>a</p>").unwrap();
        sdk.open_overlay(map, shown, marker);

        sdk.close_overlay(shown);
        sdk.close_overlay(shown);
        assert_eq!(sdk.overlay_count(), 1);

        sdk.remove_marker(marker);
        assert_eq!(sdk.overlay_count(), 1);
        sdk.close_overlay(idle);
        assert_eq!(sdk.overlay_count(), 0);
    }

    #[test]
    fn click_runs_handler() {
        let sdk = HeadlessSdk::preloaded();
        let here = GeoPoint::SEOUL_CITY_HALL;
        let map = sdk.create_map("map", here, 7).unwrap();
        let marker = sdk.create_marker(map, here, "a").unwrap();
        assert!(!sdk.click(marker));

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        sdk.add_click_listener(
            marker,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(sdk.click_titled("a"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_container_is_rejected() {
        let sdk = HeadlessSdk::preloaded();
        assert!(sdk.create_map(" ", GeoPoint::SEOUL_CITY_HALL, 7).is_err());
    }
}
