//! `nearby`: restaurants within a radius of a point, closest first.

use serde::Serialize;
use tabled::Tabled;

use choprest_core::{Restaurant, RestaurantCatalog, distance_meters, near_by};

use crate::cli::{GlobalOpts, NearbyArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

#[derive(Debug, Serialize)]
struct NearbyHit {
    distance_m: f64,
    #[serde(flatten)]
    restaurant: Restaurant,
}

#[derive(Tabled)]
struct NearbyRow {
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Address")]
    address: String,
}

fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

pub async fn handle(
    catalog: &RestaurantCatalog,
    args: NearbyArgs,
    radius_m: f64,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let center = util::parse_point(args.lat, args.lng)?;
    if !(radius_m.is_finite() && radius_m > 0.0) {
        return Err(CliError::Validation {
            field: "radius".into(),
            reason: format!("expected a positive distance in meters, got {radius_m}"),
        });
    }

    let pool = match args.keyword.as_deref() {
        Some(keyword) => catalog.search(keyword).await?,
        None => catalog.all().await?,
    };

    let mut hits: Vec<NearbyHit> = near_by(center, radius_m, &pool)
        .into_iter()
        .filter_map(|restaurant| {
            let distance_m = distance_meters(center, restaurant.position?);
            Some(NearbyHit {
                distance_m,
                restaurant,
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    tracing::info!(%center, radius_m, pool = pool.len(), hits = hits.len(), "nearby lookup");

    if hits.is_empty() {
        return Err(CliError::NoResults);
    }

    let painter = Painter::new(&global.color);
    let out = output::render_list(
        &global.output,
        &hits,
        |hit| NearbyRow {
            distance: format_distance(hit.distance_m),
            id: hit.restaurant.id.to_string(),
            name: hit.restaurant.display_name(),
            status: painter.status(&hit.restaurant.status),
            address: hit.restaurant.road_address.clone().unwrap_or_default(),
        },
        |hit| hit.restaurant.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
