//! Error types for the Footprints telemetry pipeline.

use std::time::Duration;
use thiserror::Error;

/// Configuration errors. Fatal at startup: the pipeline refuses to start.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("you must pass the option {0}")]
    MissingOption(&'static str),

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("configuration validation failed:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Command dispatch errors. Reported and skipped; a drain never aborts on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid arguments for {action}: {reason}")]
    InvalidArguments { action: String, reason: String },
}

/// Best-effort host lookups (page environment).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("{0} is unavailable")]
    Unavailable(&'static str),

    #[error("failed to read {field}: {reason}")]
    Lookup { field: &'static str, reason: String },
}

/// Delivery failures. Every variant is recoverable: the event is requeued.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("endpoint responded with status {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

impl DeliveryError {
    /// HTTP status carried by the failure, if the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            DeliveryError::Status {
                status: status.as_u16(),
                reason: error.to_string(),
            }
        } else if error.is_timeout() {
            DeliveryError::Transport(format!("request timeout: {}", error))
        } else if error.is_connect() {
            DeliveryError::Transport(format!("connection error: {}", error))
        } else {
            DeliveryError::Transport(format!("HTTP error: {}", error))
        }
    }
}

/// Top-level error returned by the public surface.
#[derive(Debug, Error)]
pub enum FootprintsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no Tokio runtime available to drive the pipeline")]
    RuntimeUnavailable,

    #[error("pipeline has not been initialized")]
    NotStarted,

    #[error(
        "timed out after {timeout:?} with {pending} events pending and {in_flight} in flight"
    )]
    FlushTimeout {
        timeout: Duration,
        pending: usize,
        in_flight: usize,
    },
}
