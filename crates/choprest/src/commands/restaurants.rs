//! Restaurant catalog command handlers.

use tabled::Tabled;

use choprest_core::{Restaurant, RestaurantCatalog, unique_regions};

use crate::cli::{FilterArgs, GlobalOpts, RestaurantsArgs, RestaurantsCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct RestaurantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Menu")]
    menu: String,
    #[tabled(rename = "Services")]
    services: String,
}

impl RestaurantRow {
    pub(crate) fn new(r: &Restaurant, painter: Painter) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.display_name(),
            region: r.region.clone().unwrap_or_default(),
            status: painter.status(&r.status),
            menu: r.main_menu.clone().unwrap_or_default(),
            services: util::services_summary(r),
        }
    }
}

fn detail(r: &Restaurant, painter: Painter) -> String {
    let heading = painter.heading(&r.display_name());
    let body = output::detail_block(
        painter,
        &[
            ("ID", Some(r.id.to_string())),
            ("Status", Some(painter.status(&r.status))),
            ("Region", r.region.clone()),
            ("Address", r.road_address.clone()),
            ("Menu", r.main_menu.clone()),
            ("Hours", r.opening_hours.clone()),
            ("Services", Some(util::services_summary(r))),
            ("Tags", Some(r.hashtags.join(" "))),
            ("Position", Some(util::position_label(r.position))),
        ],
    );
    format!("{heading}\n{body}")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    catalog: &RestaurantCatalog,
    args: RestaurantsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(&global.color);

    match args.command {
        RestaurantsCommand::List { filter, regions } => {
            let all = catalog.all().await?;
            if regions {
                let out = output::render_list(
                    &global.output,
                    &unique_regions(&all),
                    |region| RegionRow {
                        region: region.clone(),
                    },
                    Clone::clone,
                )?;
                output::print_output(&out, global.quiet);
                return Ok(());
            }
            print_restaurants(&apply(&filter, &all), painter, global)
        }

        RestaurantsCommand::Search {
            keyword,
            by_name,
            filter,
        } => {
            let found = if by_name {
                catalog.search_by_name(&keyword).await?
            } else {
                catalog.search(&keyword).await?
            };
            tracing::debug!(keyword = %keyword, hits = found.len(), "search finished");
            print_restaurants(&apply(&filter, &found), painter, global)
        }

        RestaurantsCommand::Get { id } => {
            let restaurant = catalog.get(id).await?;
            let out = output::render_single(
                &global.output,
                &restaurant,
                |r| detail(r, painter),
                |r| r.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "Region")]
    region: String,
}

fn apply(args: &FilterArgs, restaurants: &[Restaurant]) -> Vec<Restaurant> {
    util::build_filter(args).apply(restaurants)
}

fn print_restaurants(
    restaurants: &[Restaurant],
    painter: Painter,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_list(
        &global.output,
        restaurants,
        |r| RestaurantRow::new(r, painter),
        |r| r.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
