// ── Marker set ──
//
// Owns every marker on one surface plus the single info overlay. Every
// mutation tears the previous generation down before building the next, so
// two generations never coexist. The state lock is never held across an
// await or while the click callback runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, warn};

use crate::config::ZoomLevels;
use crate::error::MarkerCreationError;
use crate::model::{EntityId, MarkerRecord};
use crate::sdk::{MarkerId, OverlayId};
use crate::surface::MapSurface;

/// Invoked with the clicked record after the map has focused on it.
pub type ClickCallback = Arc<dyn Fn(&MarkerRecord) + Send + Sync>;

struct LiveMarker {
    id: MarkerId,
    record: MarkerRecord,
}

struct OpenOverlay {
    id: OverlayId,
    entity_id: EntityId,
}

#[derive(Default)]
struct State {
    generation: u64,
    markers: Vec<LiveMarker>,
    overlay: Option<OpenOverlay>,
}

struct Inner {
    surface: Arc<MapSurface>,
    zoom: ZoomLevels,
    on_click: ClickCallback,
    state: Mutex<State>,
}

/// The rendered markers of one map. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MarkerSet {
    inner: Arc<Inner>,
}

impl MarkerSet {
    pub fn new(surface: Arc<MapSurface>, zoom: ZoomLevels) -> Self {
        Self::with_click_callback(surface, zoom, Arc::new(|_: &MarkerRecord| {}))
    }

    pub fn with_click_callback(surface: Arc<MapSurface>, zoom: ZoomLevels, on_click: ClickCallback) -> Self {
        Self {
            inner: Arc::new(Inner {
                surface,
                zoom,
                on_click,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn surface(&self) -> &Arc<MapSurface> {
        &self.inner.surface
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace everything with one marker per record that has a position.
    ///
    /// Records without a position are logged and skipped. The map is
    /// centered on the first rendered record at the overview zoom; if none
    /// rendered the viewport is left alone. Returns the number rendered.
    pub fn replace_all(&self, records: &[MarkerRecord]) -> usize {
        let inner = &self.inner;
        let (rendered, first) = {
            let mut state = inner.lock();
            let generation = inner.begin_generation(&mut state);

            let mut first = None;
            for record in records {
                match inner.create_marker(record, generation) {
                    Ok(id) => {
                        if first.is_none() {
                            first = record.position;
                        }
                        state.markers.push(LiveMarker {
                            id,
                            record: record.clone(),
                        });
                    }
                    Err(e) => warn!(error = %e, "skipping record"),
                }
            }
            (state.markers.len(), first)
        };

        if let Some(center) = first {
            inner.surface.focus(center, inner.zoom.overview);
        }
        info!(
            rendered,
            skipped = records.len() - rendered,
            "markers replaced"
        );
        rendered
    }

    /// Replace everything with a single marker, open its overlay, and zoom
    /// in on it in two steps.
    ///
    /// The second zoom step is skipped when another mutation started a newer
    /// generation during the delay. A record without a position leaves the
    /// set empty.
    pub async fn replace_single(&self, record: &MarkerRecord) -> Result<(), MarkerCreationError> {
        let inner = &self.inner;
        let (generation, position) = {
            let mut state = inner.lock();
            let generation = inner.begin_generation(&mut state);
            let position = record.position.ok_or(MarkerCreationError::InvalidPosition {
                entity_id: record.entity_id,
            })?;
            let id = inner.create_marker(record, generation)?;
            state.markers.push(LiveMarker {
                id,
                record: record.clone(),
            });
            inner.open_overlay(&mut state, id, record);
            (generation, position)
        };

        let zoom = inner.zoom;
        inner.surface.pan_to(position);
        inner.surface.set_zoom(zoom.staged_medium);
        debug!(entity_id = %record.entity_id, "single marker placed");

        tokio::time::sleep(zoom.stage_delay).await;

        if inner.lock().generation == generation {
            inner.surface.set_zoom(zoom.staged_tight);
        } else {
            debug!(generation, "markers changed during staged zoom, skipping second step");
        }
        Ok(())
    }

    /// Remove every marker and the overlay. Clearing an empty set does
    /// nothing.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        if state.markers.is_empty() && state.overlay.is_none() {
            return;
        }
        self.inner.begin_generation(&mut state);
        debug!("markers cleared");
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn marker_count(&self) -> usize {
        self.inner.lock().markers.len()
    }

    pub fn has_open_overlay(&self) -> bool {
        self.inner.lock().overlay.is_some()
    }

    pub fn open_overlay_entity(&self) -> Option<EntityId> {
        self.inner.lock().overlay.as_ref().map(|o| o.entity_id)
    }

    /// Entities currently rendered, in render order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.inner
            .lock()
            .markers
            .iter()
            .map(|m| m.record.entity_id)
            .collect()
    }

    /// Incremented by every mutation that changed the set.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tear down the current generation and start a new one.
    fn begin_generation(&self, state: &mut State) -> u64 {
        let sdk = self.surface.sdk();
        if let Some(overlay) = state.overlay.take() {
            sdk.close_overlay(overlay.id);
        }
        for marker in state.markers.drain(..) {
            sdk.remove_marker(marker.id);
        }
        state.generation += 1;
        state.generation
    }

    fn create_marker(self: &Arc<Self>, record: &MarkerRecord, generation: u64) -> Result<MarkerId, MarkerCreationError> {
        let entity_id = record.entity_id;
        let position = record
            .position
            .ok_or(MarkerCreationError::InvalidPosition { entity_id })?;

        let sdk = self.surface.sdk();
        let id = sdk
            .create_marker(self.surface.map_id(), position, &record.display.name)
            .map_err(|e| MarkerCreationError::Sdk {
                entity_id,
                reason: e.0,
            })?;

        let weak: Weak<Self> = Arc::downgrade(self);
        sdk.add_click_listener(
            id,
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_click(id, generation);
                }
            }),
        );
        Ok(id)
    }

    fn open_overlay(&self, state: &mut State, anchor: MarkerId, record: &MarkerRecord) {
        let sdk = self.surface.sdk();
        if let Some(previous) = state.overlay.take() {
            sdk.close_overlay(previous.id);
        }
        match sdk.create_info_overlay(&record.display.overlay_html()) {
            Ok(id) => {
                sdk.open_overlay(self.surface.map_id(), id, anchor);
                state.overlay = Some(OpenOverlay {
                    id,
                    entity_id: record.entity_id,
                });
            }
            Err(e) => warn!(entity_id = %record.entity_id, error = %e, "could not open info overlay"),
        }
    }

    fn handle_click(&self, marker: MarkerId, generation: u64) {
        let record = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(%marker, "ignoring click on a stale marker");
                return;
            }
            let Some(record) = state
                .markers
                .iter()
                .find(|m| m.id == marker)
                .map(|m| m.record.clone())
            else {
                return;
            };
            self.open_overlay(&mut state, marker, &record);
            record
        };

        if let Some(position) = record.position {
            self.surface.focus(position, self.zoom.focus);
        }
        debug!(entity_id = %record.entity_id, "marker clicked");
        (self.on_click)(&record);
    }
}

impl std::fmt::Debug for MarkerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("MarkerSet")
            .field("generation", &state.generation)
            .field("markers", &state.markers.len())
            .field("overlay", &state.overlay.as_ref().map(|o| o.entity_id))
            .finish()
    }
}
