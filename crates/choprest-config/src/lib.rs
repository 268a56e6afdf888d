//! Shared configuration for choprest front ends.
//!
//! TOML profiles, map key resolution (env + keyring + plaintext), and
//! translation to `choprest_core::MapConfig` / `CatalogConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use choprest_core::{CatalogConfig, MapConfig, PollConfig, ZoomLevels};

/// Keyring service name.
const KEYRING_SERVICE: &str = "choprest";

/// Environment variable consulted for the map key when the profile names
/// none of its own.
pub const MAP_KEY_ENV: &str = "CHOPREST_MAP_KEY";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no map key configured for profile '{profile}'")]
    NoMapKey { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile named `name`, or the default profile when `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named server profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Restaurant API root (e.g., "http://localhost:8080").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Map provider key (plaintext, prefer keyring or env var).
    pub map_key: Option<String>,

    /// Environment variable name containing the map key.
    pub map_key_env: Option<String>,

    /// Override the SDK script URL.
    pub script_url: Option<String>,

    /// DOM id the map mounts into.
    pub container: Option<String>,

    /// SDK readiness poll interval.
    pub poll_interval_ms: Option<u64>,

    /// SDK readiness poll budget.
    pub poll_max_attempts: Option<u32>,

    /// Delay between the two zoom steps when pinning one marker.
    pub stage_delay_ms: Option<u64>,

    /// Radius for "find nearby".
    pub nearby_radius_m: Option<f64>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            map_key: None,
            map_key_env: None,
            script_url: None,
            container: None,
            poll_interval_ms: None,
            poll_max_attempts: None,
            stage_delay_ms: None,
            nearby_radius_m: None,
            timeout: None,
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8080".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "choprest", "choprest").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("choprest");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + `CHOPREST_` environment.
///
/// Nested keys use a double underscore: `CHOPREST_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CHOPREST_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Parse a TOML document on top of the defaults. No environment.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Map key resolution ──────────────────────────────────────────────

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/map-key")
}

/// Resolve the map key: the profile's env var, then `CHOPREST_MAP_KEY`,
/// then the system keyring, then plaintext in the profile.
pub fn resolve_map_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_map_key_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |user| {
            keyring::Entry::new(KEYRING_SERVICE, user)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// [`resolve_map_key`] with injectable env and keyring lookups.
pub fn resolve_map_key_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    let from_env = profile
        .map_key_env
        .as_deref()
        .into_iter()
        .chain([MAP_KEY_ENV])
        .find_map(|name| env(name).filter(|v| !v.trim().is_empty()));

    from_env
        .or_else(|| keyring(&keyring_user(profile_name)))
        .or_else(|| profile.map_key.clone())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::NoMapKey {
            profile: profile_name.into(),
        })
}

/// Store a map key in the system keyring for `profile_name`.
pub fn store_map_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?.set_password(key)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build the catalog settings from a profile.
pub fn profile_to_catalog_config(profile: &Profile) -> Result<CatalogConfig, ConfigError> {
    let base_url = parse_url("api_url", &profile.api_url)?;
    Ok(CatalogConfig {
        base_url,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(30)),
    })
}

/// Build a `MapConfig` from a profile, resolving the map key.
pub fn profile_to_map_config(profile: &Profile, profile_name: &str) -> Result<MapConfig, ConfigError> {
    let provider_key = resolve_map_key(profile, profile_name)?;
    map_config_with_key(profile, provider_key)
}

/// Build a `MapConfig` from a profile with an already-resolved key.
pub fn map_config_with_key(profile: &Profile, provider_key: SecretString) -> Result<MapConfig, ConfigError> {
    let defaults = MapConfig::default();

    let script_url = match profile.script_url.as_deref() {
        Some(raw) => parse_url("script_url", raw)?,
        None => defaults.script_url,
    };

    let poll = PollConfig {
        interval: profile
            .poll_interval_ms
            .map_or(defaults.poll.interval, Duration::from_millis),
        max_attempts: profile.poll_max_attempts.unwrap_or(defaults.poll.max_attempts),
    };
    if poll.max_attempts == 0 {
        return Err(ConfigError::Validation {
            field: "poll_max_attempts".into(),
            reason: "must be at least 1".into(),
        });
    }

    let zoom = ZoomLevels {
        stage_delay: profile
            .stage_delay_ms
            .map_or(defaults.zoom.stage_delay, Duration::from_millis),
        ..defaults.zoom
    };

    let nearby_radius_m = profile.nearby_radius_m.unwrap_or(defaults.nearby_radius_m);
    if !(nearby_radius_m.is_finite() && nearby_radius_m > 0.0) {
        return Err(ConfigError::Validation {
            field: "nearby_radius_m".into(),
            reason: format!("expected a positive distance, got {nearby_radius_m}"),
        });
    }

    Ok(MapConfig {
        provider_key,
        script_url,
        container: profile.container.clone().unwrap_or(defaults.container),
        poll,
        zoom,
        nearby_radius_m,
        ..defaults
    })
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
output = "json"

[profiles.home]
api_url = "http://192.168.0.10:8080"
map_key_env = "HOME_MAP_KEY"
poll_interval_ms = 50
stage_delay_ms = 500

[profiles.bare]
"#;

    fn none(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_profiles_over_defaults() {
        let cfg = parse_config(SAMPLE).unwrap();
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.timeout, 30);

        let (name, home) = cfg.profile(None).unwrap();
        assert_eq!(name, "home");
        assert_eq!(home.api_url, "http://192.168.0.10:8080");

        let (_, bare) = cfg.profile(Some("bare")).unwrap();
        assert_eq!(bare.api_url, "http://localhost:8080");
        assert!(matches!(
            cfg.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn map_key_chain_prefers_profile_env_then_global_env() {
        let profile = Profile {
            map_key_env: Some("HOME_MAP_KEY".into()),
            map_key: Some("plaintext".into()),
            ..Profile::default()
        };

        let key = resolve_map_key_with(
            &profile,
            "home",
            |name| (name == "HOME_MAP_KEY").then(|| "from-profile-env".into()),
            none,
        )
        .unwrap();
        assert_eq!(key.expose_secret(), "from-profile-env");

        let key = resolve_map_key_with(
            &profile,
            "home",
            |name| (name == MAP_KEY_ENV).then(|| "from-global-env".into()),
            |_| Some("from-keyring".into()),
        )
        .unwrap();
        assert_eq!(key.expose_secret(), "from-global-env");
    }

    #[test]
    fn map_key_chain_falls_back_to_keyring_then_plaintext() {
        let profile = Profile {
            map_key: Some("plaintext".into()),
            ..Profile::default()
        };

        let key = resolve_map_key_with(&profile, "home", none, |user| {
            (user == "home/map-key").then(|| "from-keyring".into())
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "from-keyring");

        let key = resolve_map_key_with(&profile, "home", none, none).unwrap();
        assert_eq!(key.expose_secret(), "plaintext");

        let err = resolve_map_key_with(&Profile::default(), "bare", none, none).unwrap_err();
        assert!(matches!(err, ConfigError::NoMapKey { ref profile } if profile == "bare"));
    }

    #[test]
    fn profile_translates_to_map_config() {
        let cfg = parse_config(SAMPLE).unwrap();
        let (_, home) = cfg.profile(Some("home")).unwrap();

        let map = map_config_with_key(home, SecretString::from("k".to_owned())).unwrap();
        assert_eq!(map.poll.interval, Duration::from_millis(50));
        assert_eq!(map.poll.max_attempts, 100);
        assert_eq!(map.zoom.stage_delay, Duration::from_millis(500));
        assert_eq!(map.zoom.overview, 7);
        assert_eq!(map.container, "map");
        assert_eq!(map.script_url.as_str(), "https://dapi.kakao.com/v2/maps/sdk.js");

        let catalog = profile_to_catalog_config(home).unwrap();
        assert_eq!(catalog.base_url.as_str(), "http://192.168.0.10:8080/");
        assert_eq!(catalog.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_values() {
        let bad_url = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_catalog_config(&bad_url),
            Err(ConfigError::Validation { ref field, .. }) if field == "api_url"
        ));

        let zero_polls = Profile {
            poll_max_attempts: Some(0),
            ..Profile::default()
        };
        assert!(map_config_with_key(&zero_polls, SecretString::from(String::new())).is_err());

        let negative_radius = Profile {
            nearby_radius_m: Some(-5.0),
            ..Profile::default()
        };
        assert!(map_config_with_key(&negative_radius, SecretString::from(String::new())).is_err());
    }

    #[test]
    fn save_then_load_round_trips_a_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_url: "http://example.test".into(),
                nearby_radius_m: Some(750.0),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, profile) = loaded.profile(None).unwrap();
        assert_eq!(profile.api_url, "http://example.test");
        assert_eq!(profile.nearby_radius_m, Some(750.0));
    }
}
