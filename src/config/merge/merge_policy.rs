//! Merge rules: defaults, override order.
//!
//! Precedence, lowest first: defaults, user-level file, project file (or the
//! explicit file), environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

pub const DEFAULT_INTERVAL_WAIT_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_IN_FLIGHT: u64 = 4;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("interval_wait_ms", DEFAULT_INTERVAL_WAIT_MS)?
        .set_default("debug", false)?
        .set_default("request_timeout_ms", DEFAULT_REQUEST_TIMEOUT_MS)?
        .set_default("connect_timeout_ms", DEFAULT_CONNECT_TIMEOUT_MS)?
        .set_default("max_in_flight", DEFAULT_MAX_IN_FLIGHT)
}
