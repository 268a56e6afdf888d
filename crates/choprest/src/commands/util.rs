//! Shared helpers for command handlers.

use choprest_core::{GeoPoint, Restaurant, ResultFilter, ServiceKind};
use strum::IntoEnumIterator;

use crate::cli::FilterArgs;
use crate::error::CliError;

/// Translate the shared filter flags into a result filter.
pub fn build_filter(args: &FilterArgs) -> ResultFilter {
    let mut filter = ResultFilter {
        operating_only: args.operating,
        ..ResultFilter::default()
    };
    if args.region.is_some() {
        filter.set_region(args.region.clone());
    }
    for kind in &args.service {
        if !filter.services.contains(kind) {
            filter.toggle_service(*kind);
        }
    }
    filter
}

/// Validate a coordinate pair from the command line.
pub fn parse_point(lat: f64, lng: f64) -> Result<GeoPoint, CliError> {
    GeoPoint::new(lat, lng).ok_or_else(|| CliError::Validation {
        field: "coordinates".into(),
        reason: format!("({lat}, {lng}) is not a valid latitude/longitude"),
    })
}

/// Comma-separated services a restaurant offers, e.g. `parking, wifi`.
pub fn services_summary(restaurant: &Restaurant) -> String {
    ServiceKind::iter()
        .filter(|kind| restaurant.services.offers(*kind))
        .map(|kind| kind.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `lat, lng` to six decimals, or `-` when the record has no position.
pub fn position_label(position: Option<GeoPoint>) -> String {
    position.map_or_else(|| "-".into(), |p| p.to_string())
}
