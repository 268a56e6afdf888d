// ── Restaurant domain type ──

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use super::entity_id::EntityId;
use super::position::GeoPoint;

/// Operating status reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RestaurantStatus {
    /// Open for business.
    Normal,
    /// Believed closed.
    Closed,
    /// Location data still under review.
    Pending,
    /// A value this client does not know about, kept verbatim.
    Other(String),
    Unknown,
}

impl RestaurantStatus {
    pub fn label(&self) -> &str {
        match self {
            Self::Normal => "operating",
            Self::Closed => "closed",
            Self::Pending => "location pending",
            Self::Other(raw) => raw,
            Self::Unknown => "unknown",
        }
    }
}

impl From<Option<&str>> for RestaurantStatus {
    fn from(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("NORMAL") => Self::Normal,
            Some("CLOSED") => Self::Closed,
            Some("PENDING") => Self::Pending,
            Some("") | None => Self::Unknown,
            Some(other) => Self::Other(other.to_owned()),
        }
    }
}

/// An amenity a diner can filter by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Parking,
    Wifi,
    KidsZone,
    Delivery,
    SmartOrder,
}

/// Amenity flags, decoded from the catalog's `"Y"` / `"N"` columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceFlags {
    pub parking: bool,
    pub wifi: bool,
    pub kids_zone: bool,
    pub delivery: bool,
    pub smart_order: bool,
    pub online_reservation: bool,
}

impl ServiceFlags {
    pub fn offers(&self, kind: ServiceKind) -> bool {
        match kind {
            ServiceKind::Parking => self.parking,
            ServiceKind::Wifi => self.wifi,
            ServiceKind::KidsZone => self.kids_zone,
            ServiceKind::Delivery => self.delivery,
            ServiceKind::SmartOrder => self.smart_order,
        }
    }
}

/// The canonical Restaurant type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restaurant {
    pub id: EntityId,
    pub name: String,
    pub branch: Option<String>,
    pub region: Option<String>,
    pub road_address: Option<String>,
    pub main_menu: Option<String>,
    pub status: RestaurantStatus,
    pub services: ServiceFlags,
    pub opening_hours: Option<String>,
    pub hashtags: Vec<String>,
    /// `None` when the catalog row has missing or unusable coordinates.
    pub position: Option<GeoPoint>,
}

impl Restaurant {
    /// Minimal constructor, mostly for tests and fixtures.
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, position: Option<GeoPoint>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            branch: None,
            region: None,
            road_address: None,
            main_menu: None,
            status: RestaurantStatus::Normal,
            services: ServiceFlags::default(),
            opening_hours: None,
            hashtags: Vec::new(),
            position,
        }
    }

    pub fn is_operating(&self) -> bool {
        self.status == RestaurantStatus::Normal
    }

    /// `"name branch"`, or just the name when there is no branch.
    pub fn display_name(&self) -> String {
        match self.branch.as_deref() {
            Some(branch) if !branch.is_empty() => format!("{} {branch}", self.name),
            _ => self.name.clone(),
        }
    }
}

impl AsRef<Restaurant> for Restaurant {
    fn as_ref(&self) -> &Restaurant {
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_from_wire() {
        assert_eq!(RestaurantStatus::from(Some("NORMAL")), RestaurantStatus::Normal);
        assert_eq!(RestaurantStatus::from(Some(" ")), RestaurantStatus::Unknown);
        assert_eq!(
            RestaurantStatus::from(Some("RELOCATED")),
            RestaurantStatus::Other("RELOCATED".into())
        );
    }

    #[test]
    fn service_kind_parses_kebab_case() {
        assert_eq!("kids-zone".parse::<ServiceKind>().unwrap(), ServiceKind::KidsZone);
        assert_eq!(ServiceKind::SmartOrder.to_string(), "smart-order");
    }

    #[test]
    fn display_name_appends_branch() {
        let mut r = Restaurant::new(1, "진진", None);
        assert_eq!(r.display_name(), "진진");
        r.branch = Some("서교점".into());
        assert_eq!(r.display_name(), "진진 서교점");
    }
}
