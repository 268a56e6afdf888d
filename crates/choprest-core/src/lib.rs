//! Map and marker synchronization engine for the choprest restaurant client.
//!
//! Sits between `choprest-api` and the front ends (CLI, embedding views):
//!
//! - **[`MapSession`]**: Lifecycle facade for one map view. Loads the SDK,
//!   mounts the surface, and runs a single task that serializes result-list
//!   changes, selections and marker clicks. Exposes the map status, the
//!   selected entity, and the nearby / locate / zoom controls.
//!
//! - **[`MapProviderLoader`]**: Single-flight bootstrap of the mapping SDK:
//!   key validation, script injection, and bounded readiness polling.
//!
//! - **[`MarkerSet`]**: The markers and the one info overlay on a
//!   [`MapSurface`]. Bulk replace, single replace with a staged zoom, and
//!   clear, each tearing down the previous generation first.
//!
//! - **[`ModeController`]**: `Auto` mirrors the result list, `Manual` pins
//!   one selected entity and ignores list changes until released.
//!
//! - **[`ResultStore`]**: Watch-channel storage for search results and the
//!   filtered view the map mirrors, with [`ResultStream`] subscriptions.
//!
//! - **[`geo`]**: Haversine distance and radius filtering.
//!
//! - **[`sdk`]**: The [`MapSdk`] seam and [`HeadlessSdk`], an in-memory
//!   implementation for terminals and tests.

pub mod catalog;
pub mod config;
pub mod convert;
pub mod error;
pub mod geo;
pub mod geolocation;
pub mod loader;
pub mod markers;
pub mod mode;
pub mod model;
pub mod sdk;
pub mod session;
pub mod store;
pub mod stream;
pub mod surface;

// ── Primary re-exports ──────────────────────────────────────────────
pub use catalog::RestaurantCatalog;
pub use config::{CatalogConfig, MapConfig, PollConfig, ZoomLevels};
pub use error::{CoreError, GeolocationError, LoadError, MapError, MarkerCreationError};
pub use geo::{Located, distance_meters, near_by};
pub use geolocation::{GeolocationOptions, Geolocator, StaticGeolocator};
pub use loader::{LoaderState, MapHandle, MapProviderLoader};
pub use markers::MarkerSet;
pub use mode::{ModeController, ModeState};
pub use sdk::{HeadlessSdk, MapSdk};
pub use session::{MapSession, MapStatus};
pub use store::ResultStore;
pub use stream::{ResultFilter, ResultStream, unique_regions};
pub use surface::MapSurface;

pub use model::{
    DisplayFields, EntityId, GeoPoint, MarkerRecord, Restaurant, RestaurantStatus, ServiceFlags, ServiceKind,
};
