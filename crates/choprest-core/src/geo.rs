// ── Distance and radius filtering ──
//
// Pure functions over `GeoPoint`. Anything with an optional position can be
// filtered; records without one are silently excluded.

use std::sync::Arc;

use crate::model::{GeoPoint, MarkerRecord, Restaurant};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Something that may sit at a point on the map.
pub trait Located {
    fn position(&self) -> Option<GeoPoint>;
}

impl Located for GeoPoint {
    fn position(&self) -> Option<GeoPoint> {
        Some(*self)
    }
}

impl Located for Restaurant {
    fn position(&self) -> Option<GeoPoint> {
        self.position
    }
}

impl Located for MarkerRecord {
    fn position(&self) -> Option<GeoPoint> {
        self.position
    }
}

impl<T: Located + ?Sized> Located for Arc<T> {
    fn position(&self) -> Option<GeoPoint> {
        (**self).position()
    }
}

impl<T: Located + ?Sized> Located for &T {
    fn position(&self) -> Option<GeoPoint> {
        (**self).position()
    }
}

/// Great-circle distance between two points, in meters.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat().to_radians();
    let phi2 = b.lat().to_radians();
    let d_phi = (b.lat() - a.lat()).to_radians();
    let d_lambda = (b.lng() - a.lng()).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `h` a hair past 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Candidates within `radius_m` of `center`, in input order.
pub fn near_by<T: Located + Clone>(center: GeoPoint, radius_m: f64, candidates: &[T]) -> Vec<T> {
    candidates
        .iter()
        .filter(|c| {
            c.position()
                .is_some_and(|p| distance_meters(center, p) <= radius_m)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn zero_distance_to_self() {
        let p = pt(37.5665, 126.978);
        assert!(distance_meters(p, p).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude() {
        // 2πR / 360
        let d = distance_meters(pt(0.0, 0.0), pt(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 1.0, "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = pt(37.5665, 126.978);
        let b = pt(35.1796, 129.0756);
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-6);
    }

    #[test]
    fn seoul_to_busan_is_about_325km() {
        let d = distance_meters(pt(37.5665, 126.978), pt(35.1796, 129.0756));
        assert!((320_000.0..330_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn antipodes_do_not_produce_nan() {
        let d = distance_meters(pt(0.0, 0.0), pt(0.0, 180.0));
        assert!(d.is_finite());
    }

    #[test]
    fn near_by_keeps_order_and_drops_missing_positions() {
        let center = pt(37.5665, 126.978);
        let candidates = vec![
            Restaurant::new(1, "close", Some(pt(37.5670, 126.9785))),
            Restaurant::new(2, "nowhere", None),
            Restaurant::new(3, "far", Some(pt(37.60, 127.05))),
            Restaurant::new(4, "also close", Some(pt(37.5660, 126.9770))),
        ];

        let hits = near_by(center, 1000.0, &candidates);
        let ids: Vec<i64> = hits.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn near_by_never_exceeds_radius() {
        let center = pt(37.5, 127.0);
        let candidates: Vec<GeoPoint> = (0..40)
            .map(|i| pt(37.5 + f64::from(i) * 0.001, 127.0 + f64::from(i) * 0.0005))
            .collect();

        let hits = near_by(center, 1000.0, &candidates);
        assert!(!hits.is_empty());
        assert!(hits.len() < candidates.len());
        for p in &hits {
            assert!(distance_meters(center, *p) <= 1000.0);
        }
    }

    #[test]
    fn near_by_works_over_shared_records() {
        let center = pt(37.5, 127.0);
        let shared = vec![Arc::new(Restaurant::new(9, "shared", Some(center)))];
        assert_eq!(near_by(center, 1.0, &shared).len(), 1);
    }
}
