// Wire models for the restaurant REST API.
//
// Field names follow the server's camelCase JSON. Everything except the id
// is optional: the catalog is scraped from public data and rows routinely
// arrive with gaps. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// A restaurant row as returned by `/api/restaurants/*`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub road_address: Option<String>,
    #[serde(default)]
    pub main_menu: Option<String>,
    /// `NORMAL`, `CLOSED`, `PENDING`, or something the server invented later.
    #[serde(default)]
    pub status: Option<String>,

    // Service flags, `"Y"` / `"N"`.
    #[serde(default)]
    pub parking: Option<String>,
    #[serde(default)]
    pub wifi: Option<String>,
    #[serde(default)]
    pub kids_zone: Option<String>,
    #[serde(default)]
    pub delivery: Option<String>,
    #[serde(default)]
    pub smart_order: Option<String>,
    #[serde(default)]
    pub online_reservation: Option<String>,

    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub holiday_info: Option<String>,
    #[serde(default)]
    pub hashtags: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,

    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_sparse_row() {
        let row: Restaurant = serde_json::from_value(json!({
            "id": 7,
            "restaurantName": "을지면옥",
            "lat": null,
            "someFutureField": true
        }))
        .unwrap();

        assert_eq!(row.id, 7);
        assert_eq!(row.restaurant_name.as_deref(), Some("을지면옥"));
        assert!(row.lat.is_none());
        assert!(row.lng.is_none());
    }

    #[test]
    fn deserializes_service_flags() {
        let row: Restaurant = serde_json::from_value(json!({
            "id": 1,
            "kidsZone": "Y",
            "smartOrder": "N",
            "lat": 37.5,
            "lng": 127.0
        }))
        .unwrap();

        assert_eq!(row.kids_zone.as_deref(), Some("Y"));
        assert_eq!(row.smart_order.as_deref(), Some("N"));
        assert_eq!(row.lat, Some(37.5));
    }
}
