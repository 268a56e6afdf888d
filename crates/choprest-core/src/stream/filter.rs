// ── Result filters ──
//
// Applied to snapshots before they reach the map, without re-querying the
// catalog.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Restaurant, RestaurantStatus, ServiceKind};

/// A single predicate over restaurants.
#[derive(Debug)]
enum RestaurantFilter {
    Operating,
    /// Region name contains the given text.
    Region(String),
    /// Offers at least one of the given services. Empty matches everything.
    AnyService(BTreeSet<ServiceKind>),
}

impl RestaurantFilter {
    fn matches(&self, restaurant: &Restaurant) -> bool {
        match self {
            Self::Operating => restaurant.status == RestaurantStatus::Normal,
            Self::Region(region) => restaurant
                .region
                .as_deref()
                .is_some_and(|r| r.contains(region.as_str())),
            Self::AnyService(kinds) => {
                kinds.is_empty() || kinds.iter().any(|k| restaurant.services.offers(*k))
            }
        }
    }
}

/// The filter state a results view holds.
///
/// Region and service selections are alternatives: choosing one resets the
/// other, matching how the list screen behaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultFilter {
    pub operating_only: bool,
    pub region: Option<String>,
    pub services: BTreeSet<ServiceKind>,
}

impl ResultFilter {
    /// Select a region, clearing any service selection. `None` or a blank
    /// string drops the region filter.
    pub fn set_region(&mut self, region: Option<String>) {
        self.region = region.filter(|r| !r.trim().is_empty());
        self.services.clear();
    }

    /// Flip one service in the multi-select, clearing any region.
    pub fn toggle_service(&mut self, kind: ServiceKind) {
        if !self.services.remove(&kind) {
            self.services.insert(kind);
        }
        self.region = None;
    }

    pub fn clear(&mut self) {
        *self = Self {
            operating_only: self.operating_only,
            ..Self::default()
        };
    }

    fn predicates(&self) -> Vec<RestaurantFilter> {
        let mut predicates = Vec::with_capacity(3);
        if self.operating_only {
            predicates.push(RestaurantFilter::Operating);
        }
        if let Some(region) = &self.region {
            predicates.push(RestaurantFilter::Region(region.clone()));
        }
        if !self.services.is_empty() {
            predicates.push(RestaurantFilter::AnyService(self.services.clone()));
        }
        predicates
    }

    /// Keep the matching items, in order.
    pub fn apply<R: AsRef<Restaurant> + Clone>(&self, items: &[R]) -> Vec<R> {
        let predicates = self.predicates();
        items
            .iter()
            .filter(|r| predicates.iter().all(|p| p.matches(r.as_ref())))
            .cloned()
            .collect()
    }
}

/// Distinct region names, sorted.
pub fn unique_regions<R: AsRef<Restaurant>>(items: &[R]) -> Vec<String> {
    items
        .iter()
        .filter_map(|r| r.as_ref().region.clone())
        .filter(|r| !r.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> Vec<Arc<Restaurant>> {
        let mut a = Restaurant::new(1, "a", None);
        a.region = Some("서울 강남구".into());
        a.services.parking = true;

        let mut b = Restaurant::new(2, "b", None);
        b.region = Some("부산 해운대구".into());
        b.services.wifi = true;
        b.status = RestaurantStatus::Closed;

        let mut c = Restaurant::new(3, "c", None);
        c.region = Some("서울 마포구".into());
        c.services.delivery = true;

        vec![Arc::new(a), Arc::new(b), Arc::new(c)]
    }

    fn ids(items: &[Arc<Restaurant>]) -> Vec<i64> {
        items.iter().map(|r| r.id.get()).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        assert_eq!(ids(&ResultFilter::default().apply(&sample())), vec![1, 2, 3]);
    }

    #[test]
    fn region_matches_substring() {
        let mut f = ResultFilter::default();
        f.set_region(Some("서울".into()));
        assert_eq!(ids(&f.apply(&sample())), vec![1, 3]);
    }

    #[test]
    fn services_are_or_ed() {
        let mut f = ResultFilter::default();
        f.toggle_service(ServiceKind::Parking);
        f.toggle_service(ServiceKind::Wifi);
        assert_eq!(ids(&f.apply(&sample())), vec![1, 2]);

        f.toggle_service(ServiceKind::Wifi);
        assert_eq!(ids(&f.apply(&sample())), vec![1]);
    }

    #[test]
    fn region_and_services_reset_each_other() {
        let mut f = ResultFilter::default();
        f.toggle_service(ServiceKind::Delivery);
        f.set_region(Some("부산".into()));
        assert!(f.services.is_empty());

        f.toggle_service(ServiceKind::Wifi);
        assert_eq!(f.region, None);
    }

    #[test]
    fn operating_only_drops_closed() {
        let f = ResultFilter {
            operating_only: true,
            ..ResultFilter::default()
        };
        assert_eq!(ids(&f.apply(&sample())), vec![1, 3]);
    }

    #[test]
    fn regions_are_unique_and_sorted() {
        let mut items = sample();
        items.push(Arc::clone(&items[0]));
        assert_eq!(
            unique_regions(&items),
            vec!["부산 해운대구".to_owned(), "서울 강남구".to_owned(), "서울 마포구".to_owned()]
        );
    }
}
