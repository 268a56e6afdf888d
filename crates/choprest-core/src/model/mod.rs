// ── Domain model ──
//
// Canonical types shared by the store, the marker engine and consumers.

pub mod entity_id;
pub mod marker;
pub mod position;
pub mod restaurant;

pub use entity_id::EntityId;
pub use marker::{DisplayFields, MarkerRecord};
pub use position::GeoPoint;
pub use restaurant::{Restaurant, RestaurantStatus, ServiceFlags, ServiceKind};
