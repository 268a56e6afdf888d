// ── Mapping SDK seam ──
//
// The engine never talks to a concrete map provider. Everything goes through
// `MapSdk`, which mirrors the handful of calls a JavaScript map SDK exposes:
// script bootstrap, one map per container, markers, info overlays, and
// viewport control. Handles are plain ids so implementations can keep their
// own object tables.

mod headless;

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use url::Url;

use crate::model::GeoPoint;

pub use headless::{HeadlessSdk, MarkerView, OverlayView};

macro_rules! sdk_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

sdk_id!(
    /// A map instance created by [`MapSdk::create_map`].
    MapId,
    "map"
);
sdk_id!(
    /// A marker created by [`MapSdk::create_marker`].
    MarkerId,
    "marker"
);
sdk_id!(
    /// An info overlay created by [`MapSdk::create_info_overlay`].
    OverlayId,
    "overlay"
);

/// Callback attached to a marker. Invoked by the SDK on click.
pub type ClickHandler = Arc<dyn Fn() + Send + Sync>;

/// Opaque failure reported by the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SdkError(pub String);

impl SdkError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// The mapping SDK as seen by the engine.
///
/// All calls except [`inject_script`](Self::inject_script) are synchronous,
/// matching the provider's JavaScript API. Implementations must not invoke
/// click handlers from inside any of these calls.
pub trait MapSdk: Send + Sync {
    /// Whether the SDK has finished its own initialization.
    fn is_ready(&self) -> bool;

    /// Load the SDK script. Resolves once the script itself has loaded,
    /// which does not imply [`is_ready`](Self::is_ready).
    fn inject_script(&self, url: &Url) -> BoxFuture<'_, Result<(), SdkError>>;

    fn create_map(&self, container: &str, center: GeoPoint, zoom: u8) -> Result<MapId, SdkError>;

    fn create_marker(&self, map: MapId, position: GeoPoint, title: &str) -> Result<MarkerId, SdkError>;

    /// Detach a marker from its map. Unknown ids are ignored.
    fn remove_marker(&self, marker: MarkerId);

    fn create_info_overlay(&self, content: &str) -> Result<OverlayId, SdkError>;

    /// Show an overlay anchored on a marker.
    fn open_overlay(&self, map: MapId, overlay: OverlayId, anchor: MarkerId);

    /// Hide and discard an overlay. Unknown or already-closed ids are ignored.
    fn close_overlay(&self, overlay: OverlayId);

    fn add_click_listener(&self, marker: MarkerId, handler: ClickHandler);

    /// Animated move of the viewport center.
    fn pan_to(&self, map: MapId, center: GeoPoint);

    /// Immediate move of the viewport center.
    fn set_center(&self, map: MapId, center: GeoPoint);

    fn set_zoom(&self, map: MapId, level: u8);

    fn center(&self, map: MapId) -> Option<GeoPoint>;

    fn zoom(&self, map: MapId) -> Option<u8>;
}
