//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `MapError` and `ConfigError` into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use choprest_config::ConfigError;
use choprest_core::{CoreError, LoadError, MapError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const MAP_UNAVAILABLE: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the restaurant API at {url}")]
    #[diagnostic(
        code(choprest::connection_failed),
        help(
            "Check that the API server is running and accessible.\n\
             URL: {url}\n\
             Override it with --api-url or CHOPREST_API_URL."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(choprest::not_found),
        help("Run: choprest {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("No restaurants matched")]
    #[diagnostic(
        code(choprest::no_results),
        help("Widen the search: drop a filter or increase --radius.")
    )]
    NoResults,

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(choprest::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Map ──────────────────────────────────────────────────────────

    #[error("Map provider key is missing or malformed")]
    #[diagnostic(
        code(choprest::map_key),
        help(
            "The key must be 32 hexadecimal characters.\n\
             Store one with: choprest config set-key\n\
             Or set CHOPREST_MAP_KEY."
        )
    )]
    MapKey,

    #[error("Map unavailable: {0}")]
    #[diagnostic(
        code(choprest::map_unavailable),
        help("The restaurant list is unaffected; only the map view failed.")
    )]
    Map(MapError),

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(choprest::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(choprest::config),
        help("Inspect the active settings with: choprest config show")
    )]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(choprest::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(choprest::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(choprest::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::NoResults => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::MapKey => exit_code::USAGE,
            Self::Config(ConfigError::Validation { .. } | ConfigError::UnknownProfile { .. }) => {
                exit_code::USAGE
            }
            Self::Map(_) => exit_code::MAP_UNAVAILABLE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::RestaurantNotFound { identifier } => CliError::NotFound {
                resource_type: "restaurant".into(),
                identifier,
                list_command: "restaurants list".into(),
            },

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            CoreError::Config { message } => CliError::Validation {
                field: "api_url".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<MapError> for CliError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::Load(LoadError::InvalidKey) => CliError::MapKey,
            MapError::UnknownEntity { entity_id } => CliError::NotFound {
                resource_type: "restaurant".into(),
                identifier: entity_id.to_string(),
                list_command: "restaurants list".into(),
            },
            MapError::NoData => CliError::NoResults,
            other => CliError::Map(other),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoMapKey { .. } => CliError::MapKey,
            other => CliError::Config(other),
        }
    }
}
