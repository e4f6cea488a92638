//! Configuration System
//!
//! Serializable settings for the pipeline, loaded from defaults, config files and
//! `FOOTPRINTS_*` environment variables, and validated before anything starts.
//! Runtime-only options (callbacks, collaborators) live in
//! [`crate::pipeline::PipelineOptions`].

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

mod merge;
mod sources;

use merge::merge_policy::{
    builder_with_defaults, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_INTERVAL_WAIT_MS,
    DEFAULT_MAX_IN_FLIGHT, DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintsConfig {
    /// Collection endpoint; every event is POSTed here. Required.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Delay between periodic processing cycles (milliseconds)
    #[serde(default = "default_interval_wait_ms")]
    pub interval_wait_ms: u64,

    /// Report non-fatal errors through the log
    #[serde(default)]
    pub debug: bool,

    /// Page start time (RFC 3339); defaults to initialization time
    #[serde(default)]
    pub page_time: Option<String>,

    /// Upper bound for one send attempt (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// TCP connect timeout for the HTTP transport (milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum concurrent send attempts
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Give up on an event after this many failed attempts (unset: retry forever)
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_interval_wait_ms() -> u64 {
    DEFAULT_INTERVAL_WAIT_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT as usize
}

impl Default for FootprintsConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            interval_wait_ms: default_interval_wait_ms(),
            debug: false,
            page_time: None,
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_in_flight: default_max_in_flight(),
            max_attempts: None,
            headers: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FootprintsConfig {
    pub fn with_endpoint(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            ..Self::default()
        }
    }

    /// Validate the entire configuration. A missing endpoint is reported on its
    /// own; everything else is collected into one error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self
            .endpoint_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingOption("endpointUrl"))?;

        let mut errors = Vec::new();

        match reqwest::Url::parse(endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "endpoint_url: unsupported scheme '{}' (must be http or https)",
                url.scheme()
            )),
            Err(e) => errors.push(format!("endpoint_url: {} ({})", e, endpoint)),
        }
        if self.interval_wait_ms == 0 {
            errors.push("interval_wait_ms: must be greater than zero".to_string());
        }
        if self.request_timeout_ms == 0 {
            errors.push("request_timeout_ms: must be greater than zero".to_string());
        }
        if self.max_in_flight == 0 {
            errors.push("max_in_flight: must be at least 1".to_string());
        }
        if self.max_attempts == Some(0) {
            errors.push("max_attempts: must be at least 1 when set".to_string());
        }
        if let Some(page_time) = &self.page_time {
            if let Err(e) = DateTime::parse_from_rfc3339(page_time) {
                errors.push(format!("page_time: {} ({})", e, page_time));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Validated endpoint.
    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        self.endpoint_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingOption("endpointUrl"))
    }

    pub fn interval_wait(&self) -> Duration {
        Duration::from_millis(self.interval_wait_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Configured page time, or `None` to use initialization time.
    pub fn page_time(&self) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.page_time
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(|e| ConfigError::InvalidOption {
                        name: "page_time",
                        reason: e.to_string(),
                    })
            })
            .transpose()
    }
}

/// Loads [`FootprintsConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults < user-level file < project files under `root` < environment.
    pub fn load(root: &Path) -> Result<FootprintsConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::project_file::add_to_builder(builder, root)?;
        let builder = sources::environment::add_to_builder(builder);
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Defaults < the given file < environment.
    pub fn load_from_file(path: &Path) -> Result<FootprintsConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Load(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        let builder = builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true));
        let builder = sources::environment::add_to_builder(builder);
        Ok(builder.build()?.try_deserialize()?)
    }
}
