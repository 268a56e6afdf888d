//! CLI configuration -- thin wrapper around `choprest_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--api-url, --map-key, --timeout).

use secrecy::SecretString;

use choprest_core::{CatalogConfig, MapConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use choprest_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile, falling back to built-in defaults when the config
/// file has none. An explicitly requested `--profile` must exist.
fn active_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    match config.profiles.get(&name) {
        Some(profile) => Ok((name, profile.clone())),
        None if global.profile.is_some() => Err(CliError::Config(
            choprest_config::ConfigError::UnknownProfile { profile: name },
        )),
        None => Ok((name, Profile::default())),
    }
}

/// Apply flag overrides (flag > env > profile) to the active profile.
fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let (name, mut profile) = active_profile(global, config)?;
    if let Some(url) = global.api_url.as_deref() {
        url.clone_into(&mut profile.api_url);
    }
    profile.timeout = Some(global.timeout);
    Ok((name, profile))
}

/// Catalog settings for the REST commands.
pub fn resolve_catalog(global: &GlobalOpts, config: &Config) -> Result<CatalogConfig, CliError> {
    let (_, profile) = effective_profile(global, config)?;
    Ok(choprest_config::profile_to_catalog_config(&profile)?)
}

/// Map settings for the `map` command. `--map-key` wins over every
/// stored key.
pub fn resolve_map(global: &GlobalOpts, config: &Config) -> Result<MapConfig, CliError> {
    let (name, profile) = effective_profile(global, config)?;
    let key = match global.map_key.as_deref() {
        Some(key) => SecretString::from(key.to_owned()),
        None => choprest_config::resolve_map_key(&profile, &name)?,
    };
    Ok(choprest_config::map_config_with_key(&profile, key)?)
}

/// Radius for nearby searches when `--radius` is not given.
pub fn nearby_radius(global: &GlobalOpts, config: &Config) -> Result<f64, CliError> {
    let (_, profile) = effective_profile(global, config)?;
    Ok(profile
        .nearby_radius_m
        .unwrap_or_else(|| MapConfig::default().nearby_radius_m))
}
