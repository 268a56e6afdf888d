// ── API-to-domain type conversions ──
//
// Bridges raw `choprest_api` rows into canonical `choprest_core::model`
// types. Flags become booleans, the status string becomes an enum, and
// coordinates are validated once here so nothing downstream has to.

use choprest_api::models::Restaurant as RestaurantRow;

use crate::model::{EntityId, GeoPoint, Restaurant, RestaurantStatus, ServiceFlags};

// ── Helpers ────────────────────────────────────────────────────────

/// `"Y"` (or the Korean `"가능"`) means yes; anything else means no.
fn flag(raw: Option<&String>) -> bool {
    matches!(raw.map(|s| s.trim()), Some("Y" | "y" | "가능"))
}

/// Drop empty strings so `Option` carries the "no data" meaning.
fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Split `"#냉면 #노포, 평양식"` into `["냉면", "노포", "평양식"]`.
fn parse_hashtags(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|tag| tag.trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

// ── Restaurant ─────────────────────────────────────────────────────

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        let services = ServiceFlags {
            parking: flag(row.parking.as_ref()),
            wifi: flag(row.wifi.as_ref()),
            kids_zone: flag(row.kids_zone.as_ref()),
            delivery: flag(row.delivery.as_ref()),
            smart_order: flag(row.smart_order.as_ref()),
            online_reservation: flag(row.online_reservation.as_ref()),
        };

        Self {
            id: EntityId::new(row.id),
            name: non_empty(row.restaurant_name).unwrap_or_else(|| format!("#{}", row.id)),
            branch: non_empty(row.branch_name),
            region: non_empty(row.region_name),
            road_address: non_empty(row.road_address),
            main_menu: non_empty(row.main_menu),
            status: RestaurantStatus::from(row.status.as_deref()),
            services,
            opening_hours: non_empty(row.opening_hours),
            hashtags: parse_hashtags(row.hashtags.as_deref()),
            position: GeoPoint::from_parts(row.lat, row.lng),
        }
    }
}
