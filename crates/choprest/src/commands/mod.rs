//! Command dispatch: bridges CLI args -> core catalog/session -> output formatting.

pub mod config_cmd;
pub mod map;
pub mod nearby;
pub mod restaurants;
pub mod util;

use choprest_core::RestaurantCatalog;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

/// Dispatch a catalog-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let catalog = RestaurantCatalog::new(&config::resolve_catalog(global, cfg)?)?;
    match cmd {
        Command::Restaurants(args) => restaurants::handle(&catalog, args, global).await,
        Command::Nearby(args) => {
            let radius = args.radius.unwrap_or(config::nearby_radius(global, cfg)?);
            nearby::handle(&catalog, args, radius, global).await
        }
        Command::Map(args) => {
            let map_config = config::resolve_map(global, cfg)?;
            map::handle(&catalog, map_config, args, global).await
        }
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config commands do not reach the catalog dispatcher".into(),
        )),
    }
}
