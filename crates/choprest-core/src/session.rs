// ── Map session ──
//
// Lifecycle facade for one map view: loads the SDK, mounts the surface,
// and runs a single task that serializes result-list changes, selections
// and marker clicks through the mode controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};
use tokio::sync::{Mutex, OnceCell, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MapConfig;
use crate::error::{GeolocationError, MapError};
use crate::geo::near_by;
use crate::geolocation::{Geolocator, locate};
use crate::loader::MapProviderLoader;
use crate::markers::MarkerSet;
use crate::mode::{ModeController, ModeState};
use crate::model::{EntityId, GeoPoint, MarkerRecord, Restaurant};
use crate::sdk::MapSdk;
use crate::store::ResultStore;
use crate::stream::Snapshot;
use crate::surface::MapSurface;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── MapStatus ────────────────────────────────────────────────────

/// What the map area should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapStatus {
    Loading,
    Ready,
    Error(String),
}

// ── Commands ─────────────────────────────────────────────────────

enum SessionCommand {
    Attach {
        markers: MarkerSet,
        reply: oneshot::Sender<Result<(), MapError>>,
    },
    Select {
        id: EntityId,
        reply: oneshot::Sender<Result<(), MapError>>,
    },
    Deselect {
        reply: oneshot::Sender<()>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
}

// ── MapSession ───────────────────────────────────────────────────

/// One map view and everything feeding it.
///
/// Cheaply cloneable. Call [`start`](Self::start) once; selections issued
/// while the SDK is still loading are recorded and rendered when it is up.
#[derive(Clone)]
pub struct MapSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: MapConfig,
    loader: MapProviderLoader,
    store: Arc<ResultStore>,
    geolocator: Option<Arc<dyn Geolocator>>,
    status: watch::Sender<MapStatus>,
    selected: watch::Sender<Option<EntityId>>,
    mode: watch::Sender<ModeState>,
    current_location: watch::Sender<Option<GeoPoint>>,
    surface: ArcSwapOption<MapSurface>,
    markers: ArcSwapOption<MarkerSet>,
    fallback: ArcSwap<Vec<Arc<Restaurant>>>,
    command_tx: mpsc::Sender<SessionCommand>,
    command_rx: Mutex<Option<mpsc::Receiver<SessionCommand>>>,
    click_tx: mpsc::UnboundedSender<EntityId>,
    click_rx: Mutex<Option<mpsc::UnboundedReceiver<EntityId>>>,
    running: AtomicBool,
    started: OnceCell<Result<(), MapError>>,
    warnings: Mutex<Vec<String>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl MapSession {
    /// Build a session. Does not touch the SDK until [`start`](Self::start).
    pub fn new(config: MapConfig, sdk: Arc<dyn MapSdk>, geolocator: Option<Arc<dyn Geolocator>>) -> Self {
        let loader = MapProviderLoader::from_config(sdk, &config);
        let (status, _) = watch::channel(MapStatus::Loading);
        let (selected, _) = watch::channel(None);
        let (mode, _) = watch::channel(ModeState::Auto);
        let (current_location, _) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (click_tx, click_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(SessionInner {
                config,
                loader,
                store: Arc::new(ResultStore::new()),
                geolocator,
                status,
                selected,
                mode,
                current_location,
                surface: ArcSwapOption::empty(),
                markers: ArcSwapOption::empty(),
                fallback: ArcSwap::from_pointee(Vec::new()),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                click_tx,
                click_rx: Mutex::new(Some(click_rx)),
                running: AtomicBool::new(false),
                started: OnceCell::new(),
                warnings: Mutex::new(Vec::new()),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Load the SDK, mount the map, and render the current mode.
    ///
    /// Only the first call does the work; later calls return its outcome.
    /// On failure the status watch carries the error and no marker call is
    /// ever made.
    pub async fn start(&self) -> Result<(), MapError> {
        self.inner.started.get_or_init(|| self.boot()).await.clone()
    }

    async fn boot(&self) -> Result<(), MapError> {
        self.spawn_run_loop().await;

        let result = self.bring_up().await;
        match &result {
            Ok(()) => {
                info!(container = %self.inner.config.container, "map ready");
                self.inner.status.send_replace(MapStatus::Ready);
            }
            Err(e) => {
                warn!(error = %e, "map unavailable");
                self.inner.status.send_replace(MapStatus::Error(e.to_string()));
            }
        }
        result
    }

    async fn bring_up(&self) -> Result<(), MapError> {
        let config = &self.inner.config;
        let handle = self.inner.loader.ensure_loaded().await?;
        let surface = Arc::new(MapSurface::mount(
            handle,
            &config.container,
            config.default_center,
            config.default_zoom,
        )?);
        self.inner.surface.store(Some(Arc::clone(&surface)));

        let click_tx = self.inner.click_tx.clone();
        let markers = MarkerSet::with_click_callback(
            surface,
            config.zoom,
            Arc::new(move |record: &MarkerRecord| {
                let _ = click_tx.send(record.entity_id);
            }),
        );
        self.inner.markers.store(Some(Arc::new(markers.clone())));

        self.request(|reply| SessionCommand::Attach { markers, reply })
            .await?
    }

    async fn spawn_run_loop(&self) {
        let commands = self.inner.command_rx.lock().await.take();
        let clicks = self.inner.click_rx.lock().await.take();
        let (Some(commands), Some(clicks)) = (commands, clicks) else {
            return;
        };
        let session = self.clone();
        self.inner.running.store(true, Ordering::Release);
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(run_loop(session, commands, clicks)));
    }

    /// Stop background tasks and drop every marker. Later commands fail
    /// with [`MapError::SessionClosed`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        if let Some(markers) = self.inner.markers.swap(None) {
            markers.clear();
        }
        debug!("map session shut down");
    }

    // ── Commands ─────────────────────────────────────────────────

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, MapError> {
        if self.inner.cancel.is_cancelled() {
            return Err(MapError::SessionClosed);
        }
        if !self.inner.running.load(Ordering::Acquire) {
            return Err(MapError::NotReady);
        }
        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(build(tx))
            .await
            .map_err(|_| MapError::SessionClosed)?;
        rx.await.map_err(|_| MapError::SessionClosed)
    }

    /// Pin one result on the map.
    pub async fn select(&self, id: EntityId) -> Result<(), MapError> {
        self.request(|reply| SessionCommand::Select { id, reply })
            .await?
    }

    /// Release the pin and show every result again.
    pub async fn deselect(&self) -> Result<(), MapError> {
        self.request(|reply| SessionCommand::Deselect { reply }).await
    }

    /// Card expand/collapse: deselect when `id` is the pinned entity,
    /// select it otherwise.
    pub async fn toggle(&self, id: EntityId) -> Result<(), MapError> {
        if self.mode() == ModeState::Manual(id) {
            self.deselect().await
        } else {
            self.select(id).await
        }
    }

    /// Wait until every result change and command sent so far has been
    /// applied to the map.
    pub async fn flush(&self) -> Result<(), MapError> {
        self.request(|reply| SessionCommand::Flush { reply }).await
    }

    /// Replace the search results.
    pub fn publish_results(&self, results: Vec<Restaurant>) {
        self.inner.store.publish(results);
    }

    /// The pool "find nearby" searches when there are no search results.
    pub fn set_fallback(&self, all: Vec<Restaurant>) {
        self.inner
            .fallback
            .store(Arc::new(all.into_iter().map(Arc::new).collect()));
    }

    /// Show only results within `radius_m` of the map center (the configured
    /// radius when `None`). Searches the current results, or the fallback
    /// pool when there are none. Releases any pin so the hits are visible.
    pub async fn find_nearby(&self, radius_m: Option<f64>) -> Result<usize, MapError> {
        let surface = self.inner.surface.load_full().ok_or(MapError::NotReady)?;
        let radius = radius_m.unwrap_or(self.inner.config.nearby_radius_m);

        let mut pool: Snapshot = self.inner.store.results_snapshot();
        if pool.is_empty() {
            pool = self.inner.fallback.load_full();
        }
        if pool.is_empty() {
            return Err(MapError::NoData);
        }

        let center = surface.center();
        let hits = near_by(center, radius, pool.as_slice());
        info!(%center, radius, hits = hits.len(), "nearby search");

        if matches!(self.mode(), ModeState::Manual(_)) {
            self.deselect().await?;
        }
        let count = hits.len();
        self.inner.store.publish_view(hits);
        self.flush().await?;
        Ok(count)
    }

    /// Ask the geolocator for a fix and center the map on it.
    ///
    /// A failure is recorded as a warning and returned; markers and mode are
    /// left alone either way.
    pub async fn locate_me(&self) -> Result<GeoPoint, MapError> {
        let result = match &self.inner.geolocator {
            Some(locator) => locate(locator.as_ref(), self.inner.config.geolocation).await,
            None => Err(GeolocationError::Unsupported),
        };

        match result {
            Ok(position) => {
                self.inner.current_location.send_replace(Some(position));
                if let Some(surface) = self.inner.surface.load_full() {
                    surface.focus(position, self.inner.config.zoom.focus);
                }
                Ok(position)
            }
            Err(e) => {
                warn!(error = %e, "location unavailable");
                self.inner.warnings.lock().await.push(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn zoom_in(&self) -> Result<u8, MapError> {
        Ok(self.surface().ok_or(MapError::NotReady)?.zoom_in())
    }

    pub fn zoom_out(&self) -> Result<u8, MapError> {
        Ok(self.surface().ok_or(MapError::NotReady)?.zoom_out())
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to map status changes.
    pub fn status(&self) -> watch::Receiver<MapStatus> {
        self.inner.status.subscribe()
    }

    /// The host's "selected entity": set by selection and by marker clicks.
    pub fn selected(&self) -> watch::Receiver<Option<EntityId>> {
        self.inner.selected.subscribe()
    }

    pub fn mode(&self) -> ModeState {
        *self.inner.mode.borrow()
    }

    pub fn current_location(&self) -> Option<GeoPoint> {
        *self.inner.current_location.borrow()
    }

    pub fn surface(&self) -> Option<Arc<MapSurface>> {
        self.inner.surface.load_full()
    }

    pub fn markers(&self) -> Option<Arc<MarkerSet>> {
        self.inner.markers.load_full()
    }

    /// Drain warnings accumulated so far (e.g. a denied location request).
    pub async fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.warnings.lock().await)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Owns the mode controller. Result changes are applied before queued
/// commands so a `flush()` issued after a publish observes it.
async fn run_loop(
    session: MapSession,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut clicks: mpsc::UnboundedReceiver<EntityId>,
) {
    let inner = &session.inner;
    let mut results = inner.store.subscribe_filtered();
    let mut mode = ModeController::new();
    mode.on_results_changed(Arc::clone(results.current()));

    loop {
        tokio::select! {
            biased;
            () = inner.cancel.cancelled() => break,
            snapshot = results.changed() => {
                let Some(snapshot) = snapshot else { break };
                mode.on_results_changed(snapshot);
            }
            command = commands.recv() => {
                let Some(command) = command else { break };
                handle_command(inner, &mut mode, command).await;
            }
            Some(id) = clicks.recv() => {
                debug!(%id, "marker click");
                inner.selected.send_replace(Some(id));
            }
        }
    }
    debug!("map session run loop stopped");
}

async fn handle_command(inner: &SessionInner, mode: &mut ModeController, command: SessionCommand) {
    match command {
        SessionCommand::Attach { markers, reply } => {
            let result = mode.attach(markers).await;
            if mode.mode() == ModeState::Auto {
                inner.selected.send_replace(None);
            }
            publish_mode(inner, mode);
            let _ = reply.send(result);
        }
        SessionCommand::Select { id, reply } => {
            let result = mode.select(id).await;
            if mode.mode() == ModeState::Manual(id) {
                inner.selected.send_replace(Some(id));
            }
            if let Err(ref e) = result {
                warn!(%id, error = %e, "selection not shown");
            }
            publish_mode(inner, mode);
            let _ = reply.send(result);
        }
        SessionCommand::Deselect { reply } => {
            mode.deselect();
            inner.selected.send_replace(None);
            publish_mode(inner, mode);
            let _ = reply.send(());
        }
        SessionCommand::Flush { reply } => {
            let _ = reply.send(());
        }
    }
}

fn publish_mode(inner: &SessionInner, mode: &ModeController) {
    let next = mode.mode();
    inner.mode.send_if_modified(|current| {
        let changed = *current != next;
        *current = next;
        changed
    });
}
