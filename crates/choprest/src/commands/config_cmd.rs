//! Config subcommand handlers.

use std::str::FromStr;

use dialoguer::{Input, Password, Select};

use choprest_core::loader::is_valid_provider_key;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with stored secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.map_key.is_some() {
            profile.map_key = Some("****".into());
        }
    }
    cfg
}

/// TOML view of the config for the table output mode.
fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# could not render config: {e}"))
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_field<T: FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

/// Prompt for a map key until it has the right shape.
fn prompt_map_key() -> Result<String, CliError> {
    let key = Password::new()
        .with_prompt("Map provider key")
        .interact()
        .map_err(prompt_err)?;
    let key = key.trim().to_owned();
    if !is_valid_provider_key(&key) {
        return Err(CliError::MapKey);
    }
    Ok(key)
}

/// Apply `key = value` to a profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "api_url" => {
            url::Url::parse(&value).map_err(|e| CliError::Validation {
                field: "api_url".into(),
                reason: format!("invalid URL: {e}"),
            })?;
            profile.api_url = value;
        }
        "map_key" => {
            if !is_valid_provider_key(&value) {
                return Err(CliError::MapKey);
            }
            profile.map_key = Some(value);
        }
        "map_key_env" => profile.map_key_env = Some(value),
        "script_url" => profile.script_url = Some(value),
        "container" => profile.container = Some(value),
        "poll_interval_ms" => {
            profile.poll_interval_ms = Some(parse_field(key, &value, "a number (milliseconds)")?);
        }
        "poll_max_attempts" => {
            let attempts: u32 = parse_field(key, &value, "a positive number")?;
            if attempts == 0 {
                return Err(CliError::Validation {
                    field: key.into(),
                    reason: "must be at least 1".into(),
                });
            }
            profile.poll_max_attempts = Some(attempts);
        }
        "stage_delay_ms" => {
            profile.stage_delay_ms = Some(parse_field(key, &value, "a number (milliseconds)")?);
        }
        "nearby_radius_m" => {
            let radius: f64 = parse_field(key, &value, "a distance in meters")?;
            if !(radius.is_finite() && radius > 0.0) {
                return Err(CliError::Validation {
                    field: key.into(),
                    reason: "must be a positive distance".into(),
                });
            }
            profile.nearby_radius_m = Some(radius);
        }
        "timeout" => profile.timeout = Some(parse_field(key, &value, "a number (seconds)")?),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api_url, map_key, map_key_env, \
                     script_url, container, poll_interval_ms, poll_max_attempts, \
                     stage_delay_ms, nearby_radius_m, timeout"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("choprest configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("Restaurant API URL")
                .default("http://localhost:8080".into())
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::default();
            set_profile_value(&mut profile, "api_url", api_url)?;

            let choices = &[
                "Store map key in system keyring (recommended)",
                "Save map key to config file (plaintext)",
                "Skip (set CHOPREST_MAP_KEY later)",
            ];
            let selection = Select::new()
                .with_prompt("Map provider key")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            match selection {
                0 => {
                    let key = prompt_map_key()?;
                    choprest_config::store_map_key(&profile_name, &key)?;
                    eprintln!("   map key stored in system keyring");
                }
                1 => profile.map_key = Some(prompt_map_key()?),
                _ => {}
            }

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }
            save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Try it: choprest restaurants list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_value(profile, &key, value)?;

            save_config(&cfg)?;
            eprintln!("Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: choprest config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(choprest_config::ConfigError::UnknownProfile { profile: name }.into());
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }

        // ── SetKey ──────────────────────────────────────────────────
        ConfigCommand::SetKey { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let key = prompt_map_key()?;
            choprest_config::store_map_key(&profile_name, &key)?;
            eprintln!("Map key stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}
