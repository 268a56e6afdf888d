// ── Mode controller ──
//
// Decides what the marker set shows. `Auto` mirrors the whole result list;
// `Manual` pins one selected entity and ignores list changes until the
// selection is released. The mode is read before any marker call, inside the
// same call, so a list update can never overwrite a pinned marker.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{MapError, MarkerCreationError};
use crate::markers::MarkerSet;
use crate::model::{EntityId, MarkerRecord, Restaurant};

/// What the markers currently mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "entity_id", rename_all = "snake_case")]
pub enum ModeState {
    #[default]
    Auto,
    Manual(EntityId),
}

impl ModeState {
    pub fn selected(self) -> Option<EntityId> {
        match self {
            Self::Auto => None,
            Self::Manual(id) => Some(id),
        }
    }
}

/// Owns the mode and routes result/selection changes into the marker set.
///
/// Works without a marker set: selections and result lists are recorded and
/// rendered once [`attach`](Self::attach) is called.
#[derive(Default)]
pub struct ModeController {
    mode: ModeState,
    results: Arc<Vec<Arc<Restaurant>>>,
    markers: Option<MarkerSet>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ModeState {
        self.mode
    }

    /// The latest result list, whatever the mode.
    pub fn results(&self) -> &Arc<Vec<Arc<Restaurant>>> {
        &self.results
    }

    pub fn markers(&self) -> Option<&MarkerSet> {
        self.markers.as_ref()
    }

    /// The map became available. Renders according to the current mode.
    ///
    /// A pin recorded before attach whose entity can no longer be drawn is
    /// released: the controller falls back to `Auto` and mirrors the list.
    pub async fn attach(&mut self, markers: MarkerSet) -> Result<(), MapError> {
        self.markers = Some(markers);
        if let ModeState::Manual(id) = self.mode {
            let Err(e) = self.render_single(id).await else {
                return Ok(());
            };
            warn!(%id, error = %e, "pending selection dropped at attach");
            self.mode = ModeState::Auto;
        }
        self.render_auto();
        Ok(())
    }

    /// Record a new result list and, in `Auto`, render it.
    pub fn on_results_changed(&mut self, results: Arc<Vec<Arc<Restaurant>>>) {
        self.results = results;
        match self.mode {
            ModeState::Auto => self.render_auto(),
            ModeState::Manual(id) => {
                debug!(%id, count = self.results.len(), "result list changed while pinned, markers untouched");
            }
        }
    }

    /// Pin one entity.
    ///
    /// Unknown entities and entities without coordinates are rejected and
    /// leave mode and markers as they were. Selecting while another entity
    /// is pinned switches the pin.
    pub async fn select(&mut self, id: EntityId) -> Result<(), MapError> {
        let restaurant = self.find(id).ok_or(MapError::UnknownEntity { entity_id: id })?;
        if restaurant.position.is_none() {
            return Err(MarkerCreationError::InvalidPosition { entity_id: id }.into());
        }

        debug!(%id, previous = ?self.mode, "pinning entity");
        self.mode = ModeState::Manual(id);
        self.render_single(id).await
    }

    /// Release the pin and mirror the current list again. No-op in `Auto`.
    pub fn deselect(&mut self) {
        if let ModeState::Manual(id) = self.mode {
            debug!(%id, "releasing pinned entity");
            self.mode = ModeState::Auto;
            self.render_auto();
        }
    }

    fn find(&self, id: EntityId) -> Option<Arc<Restaurant>> {
        self.results.iter().find(|r| r.id == id).cloned()
    }

    fn render_auto(&self) {
        let Some(markers) = &self.markers else {
            return;
        };
        markers.clear();
        if self.results.is_empty() {
            return;
        }
        let records: Vec<MarkerRecord> = self.results.iter().map(|r| MarkerRecord::from(r.as_ref())).collect();
        markers.replace_all(&records);
    }

    async fn render_single(&self, id: EntityId) -> Result<(), MapError> {
        let Some(markers) = self.markers.clone() else {
            return Ok(());
        };
        let record = self
            .find(id)
            .map(|r| MarkerRecord::from(r.as_ref()))
            .ok_or(MapError::UnknownEntity { entity_id: id })?;
        markers.clear();
        markers.replace_single(&record).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ZoomLevels;
    use crate::model::GeoPoint;
    use crate::surface::tests::headless_surface;

    fn restaurant(id: i64, lat: f64, lng: f64) -> Arc<Restaurant> {
        Arc::new(Restaurant::new(id, format!("r{id}"), GeoPoint::new(lat, lng)))
    }

    fn list(ids: &[i64]) -> Arc<Vec<Arc<Restaurant>>> {
        Arc::new(
            ids.iter()
                .map(|&id| {
                    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
                    let offset = id as f64 * 0.001;
                    restaurant(id, 37.5 + offset, 127.0 + offset)
                })
                .collect(),
        )
    }

    async fn attached(ids: &[i64]) -> ModeController {
        let (_sdk, surface) = headless_surface().await;
        let mut mode = ModeController::new();
        mode.on_results_changed(list(ids));
        mode.attach(MarkerSet::new(surface, ZoomLevels::default()))
            .await
            .unwrap();
        mode
    }

    fn rendered(mode: &ModeController) -> Vec<i64> {
        mode.markers()
            .unwrap()
            .entity_ids()
            .iter()
            .map(|id| id.get())
            .collect()
    }

    #[tokio::test]
    async fn auto_mirrors_every_list_change() {
        let mut mode = attached(&[1, 2, 3]).await;
        assert_eq!(rendered(&mode), vec![1, 2, 3]);

        mode.on_results_changed(list(&[4, 5]));
        assert_eq!(rendered(&mode), vec![4, 5]);

        mode.on_results_changed(Arc::new(Vec::new()));
        assert!(rendered(&mode).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_is_immune_to_list_changes() {
        let mut mode = attached(&[1, 2, 42]).await;
        mode.select(EntityId::new(42)).await.unwrap();
        assert_eq!(mode.mode(), ModeState::Manual(EntityId::new(42)));
        assert_eq!(rendered(&mode), vec![42]);

        mode.on_results_changed(list(&[7, 8, 9]));
        assert_eq!(rendered(&mode), vec![42]);
        assert_eq!(mode.results().len(), 3);
        assert!(mode.markers().unwrap().has_open_overlay());

        mode.deselect();
        assert_eq!(mode.mode(), ModeState::Auto);
        assert_eq!(rendered(&mode), vec![7, 8, 9]);
        assert!(!mode.markers().unwrap().has_open_overlay());
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_another_entity_switches_the_pin() {
        let mut mode = attached(&[1, 2]).await;
        mode.select(EntityId::new(1)).await.unwrap();
        mode.select(EntityId::new(2)).await.unwrap();

        assert_eq!(mode.mode(), ModeState::Manual(EntityId::new(2)));
        assert_eq!(rendered(&mode), vec![2]);
        assert_eq!(
            mode.markers().unwrap().open_overlay_entity(),
            Some(EntityId::new(2))
        );
    }

    #[tokio::test]
    async fn rejected_selection_changes_nothing() {
        let mut mode = attached(&[1, 2]).await;
        let mut results = (*list(&[1, 2])).clone();
        results.push(Arc::new(Restaurant::new(3, "no coords", None)));
        mode.on_results_changed(Arc::new(results));
        let generation = mode.markers().unwrap().generation();

        let err = mode.select(EntityId::new(99)).await.unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownEntity {
                entity_id: EntityId::new(99)
            }
        );

        let err = mode.select(EntityId::new(3)).await.unwrap_err();
        assert!(matches!(
            err,
            MapError::MarkerCreation(MarkerCreationError::InvalidPosition { .. })
        ));

        assert_eq!(mode.mode(), ModeState::Auto);
        assert_eq!(mode.markers().unwrap().generation(), generation);
        assert_eq!(rendered(&mode), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_before_attach_renders_on_attach() {
        let (sdk, surface) = headless_surface().await;
        let mut mode = ModeController::new();
        mode.on_results_changed(list(&[1, 2, 3]));
        mode.select(EntityId::new(2)).await.unwrap();
        assert_eq!(sdk.marker_count(), 0);

        mode.attach(MarkerSet::new(surface, ZoomLevels::default()))
            .await
            .unwrap();
        assert_eq!(rendered(&mode), vec![2]);
        assert_eq!(mode.markers().unwrap().surface().zoom(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_selection_falls_back_to_auto_on_attach() {
        let (sdk, surface) = headless_surface().await;
        let mut mode = ModeController::new();
        mode.on_results_changed(list(&[1, 2, 3]));
        mode.select(EntityId::new(2)).await.unwrap();
        mode.on_results_changed(list(&[1]));

        mode.attach(MarkerSet::new(surface, ZoomLevels::default()))
            .await
            .unwrap();
        assert_eq!(mode.mode(), ModeState::Auto);
        assert_eq!(rendered(&mode), vec![1]);
        assert_eq!(sdk.marker_count(), 1);
        assert!(!mode.markers().unwrap().has_open_overlay());
    }

    #[tokio::test]
    async fn deselect_in_auto_is_a_no_op() {
        let mut mode = attached(&[1, 2]).await;
        let generation = mode.markers().unwrap().generation();
        mode.deselect();
        assert_eq!(mode.markers().unwrap().generation(), generation);
    }
}
