// ── Core error types ──
//
// Two families live here. `CoreError` covers the restaurant catalog and is
// what CLI consumers see for REST failures; the `From<choprest_api::Error>`
// impl keeps HTTP details out of their way. The map family (`LoadError`,
// `MarkerCreationError`, `GeolocationError`, wrapped by `MapError`) never
// leaves the map subsystem: a broken map degrades the map view only.

use thiserror::Error;

use crate::model::EntityId;

// ── Catalog ─────────────────────────────────────────────────────────

/// Unified error type for catalog access.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Cannot reach restaurant server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Restaurant not found: {identifier}")]
    RestaurantNotFound { identifier: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<choprest_api::Error> for CoreError {
    fn from(err: choprest_api::Error) -> Self {
        match err {
            choprest_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            choprest_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            choprest_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            choprest_api::Error::ClientSetup(message) => CoreError::Config { message },
            choprest_api::Error::NotFound { path } => CoreError::RestaurantNotFound {
                identifier: path.rsplit('/').next().unwrap_or_default().to_owned(),
            },
            choprest_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            choprest_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

// ── Map subsystem ───────────────────────────────────────────────────

/// The mapping SDK could not be brought up. Shared verbatim by every
/// caller waiting on the same load, hence `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("map provider key is not a 32-character hex string")]
    InvalidKey,

    #[error("map SDK script failed to load: {reason}")]
    Script { reason: String },

    #[error("map SDK not ready after {attempts} checks ({waited_ms}ms)")]
    NotReady { attempts: u32, waited_ms: u64 },
}

/// A single record could not become a marker. The record is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerCreationError {
    #[error("entity {entity_id} has no valid coordinates")]
    InvalidPosition { entity_id: EntityId },

    #[error("map SDK rejected marker for entity {entity_id}: {reason}")]
    Sdk { entity_id: EntityId, reason: String },
}

/// Browser-style geolocation failure. Surfaced as a dismissable warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("current position unavailable")]
    Unavailable,

    #[error("location request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("geolocation is not supported here")]
    Unsupported,
}

/// Umbrella error for map operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    MarkerCreation(#[from] MarkerCreationError),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error("could not mount map into '{container}': {reason}")]
    Mount { container: String, reason: String },

    #[error("map is not ready")]
    NotReady,

    #[error("no result with id {entity_id}")]
    UnknownEntity { entity_id: EntityId },

    #[error("no restaurant data loaded yet")]
    NoData,

    #[error("map session has shut down")]
    SessionClosed,
}
