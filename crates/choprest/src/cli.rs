//! Clap derive structures for the `choprest` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use choprest_core::{EntityId, ServiceKind};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// choprest -- browse restaurants and drive the map engine from a terminal
#[derive(Debug, Parser)]
#[command(
    name = "choprest",
    version,
    about = "Browse restaurants and their map markers from the command line",
    long_about = "Queries the choprest restaurant API and runs the map/marker engine\n\
        against an in-memory map, printing exactly what a browser map would show.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "CHOPREST_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Restaurant API root URL (overrides profile)
    #[arg(long, short = 'u', env = "CHOPREST_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Map provider key (overrides profile and keyring)
    #[arg(long, env = "CHOPREST_MAP_KEY", global = true, hide_env_values = true)]
    pub map_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CHOPREST_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "CHOPREST_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the restaurant catalog
    #[command(alias = "r")]
    Restaurants(RestaurantsArgs),

    /// Restaurants within a radius of a point
    Nearby(NearbyArgs),

    /// Render results on an in-memory map and print its state
    Map(MapArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Filter Arguments ──────────────────────────────────────────

/// Result filters shared by every listing command.
#[derive(Debug, Args, Default)]
pub struct FilterArgs {
    /// Keep restaurants whose region contains this text
    #[arg(long, conflicts_with = "service")]
    pub region: Option<String>,

    /// Keep restaurants offering any of these services (repeatable)
    #[arg(long, value_parser = parse_service)]
    pub service: Vec<ServiceKind>,

    /// Keep only restaurants currently operating
    #[arg(long)]
    pub operating: bool,
}

fn parse_service(raw: &str) -> Result<ServiceKind, String> {
    raw.parse().map_err(|_| {
        format!("unknown service '{raw}' (expected parking, wifi, kids-zone, delivery, smart-order)")
    })
}

fn parse_entity_id(raw: &str) -> Result<EntityId, String> {
    raw.parse()
        .map_err(|_| format!("'{raw}' is not a restaurant id"))
}

/// `LAT,LNG` pair.
#[derive(Debug, Clone, Copy)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

fn parse_lat_lng(raw: &str) -> Result<LatLng, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{raw}'"))?;
    let lat = lat.trim().parse().map_err(|_| format!("bad latitude '{lat}'"))?;
    let lng = lng.trim().parse().map_err(|_| format!("bad longitude '{lng}'"))?;
    Ok(LatLng { lat, lng })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RESTAURANTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RestaurantsArgs {
    #[command(subcommand)]
    pub command: RestaurantsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RestaurantsCommand {
    /// List every restaurant
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print the distinct regions instead of restaurants
        #[arg(long)]
        regions: bool,
    },

    /// Search by keyword (name and branch)
    Search {
        /// Search keyword
        keyword: String,

        /// Match restaurant names only
        #[arg(long)]
        by_name: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show one restaurant
    Get {
        /// Restaurant id
        #[arg(value_parser = parse_entity_id)]
        id: EntityId,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NEARBY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NearbyArgs {
    /// Center latitude
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Center longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Radius in meters (defaults to the profile's nearby radius)
    #[arg(long)]
    pub radius: Option<f64>,

    /// Search this keyword first instead of the whole catalog
    #[arg(long, short = 'k')]
    pub keyword: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MAP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MapArgs {
    /// Search keyword feeding the map (whole catalog when omitted)
    #[arg(long, short = 'k')]
    pub keyword: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Pin one restaurant (manual mode)
    #[arg(long, value_parser = parse_entity_id)]
    pub select: Option<EntityId>,

    /// Pretend the device is at LAT,LNG and center the map there
    #[arg(long, value_parser = parse_lat_lng, allow_hyphen_values = true)]
    pub here: Option<LatLng>,

    /// Keep only results near the map center (replaces any region or service filter)
    #[arg(long, conflicts_with_all = ["select", "region", "service"])]
    pub nearby: bool,

    /// Radius for --nearby, in meters
    #[arg(long, requires = "nearby")]
    pub radius: Option<f64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Set a profile value
    Set {
        /// Profile key (e.g., "api_url", "nearby_radius_m")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the map provider key in the system keyring
    SetKey {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
