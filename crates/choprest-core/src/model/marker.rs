// ── Marker records ──
//
// The slice of a restaurant the marker engine needs: where to put the pin
// and what to show in its info overlay.

use serde::Serialize;

use super::entity_id::EntityId;
use super::position::GeoPoint;
use super::restaurant::Restaurant;

/// Text shown in a marker's info overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayFields {
    pub name: String,
    pub branch: Option<String>,
    pub road_address: Option<String>,
    pub main_menu: Option<String>,
}

/// One renderable entity.
///
/// `position` is `None` when the upstream row had no usable coordinates;
/// such records are skipped at render time rather than rejected up front,
/// so callers can hand over a result list unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerRecord {
    pub entity_id: EntityId,
    pub position: Option<GeoPoint>,
    pub display: DisplayFields,
}

impl From<&Restaurant> for MarkerRecord {
    fn from(r: &Restaurant) -> Self {
        Self {
            entity_id: r.id,
            position: r.position,
            display: DisplayFields {
                name: r.name.clone(),
                branch: r.branch.clone(),
                road_address: r.road_address.clone(),
                main_menu: r.main_menu.clone(),
            },
        }
    }
}

impl DisplayFields {
    /// HTML for the info overlay. Every field is escaped.
    pub fn overlay_html(&self) -> String {
        let mut html = String::from(r#"<div class="choprest-overlay">"#);
        html.push_str(&format!("<h3>{}</h3>", escape_html(&self.name)));
        if let Some(branch) = self.branch.as_deref().filter(|b| !b.is_empty()) {
            html.push_str(&format!(r#"<p class="branch">{}</p>"#, escape_html(branch)));
        }
        let address = self.road_address.as_deref().unwrap_or("주소 정보 없음");
        html.push_str(&format!(r#"<p class="address">{}</p>"#, escape_html(address)));
        let menu = self.main_menu.as_deref().unwrap_or("메뉴 정보 없음");
        html.push_str(&format!(r#"<p class="menu">{}</p>"#, escape_html(menu)));
        html.push_str("</div>");
        html
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
