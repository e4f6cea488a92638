//! CLI output: error mapping to a stable CLI surface.

use crate::error::{ConfigError, FootprintsError};

/// Render an error chain for the terminal, one cause per line.
pub fn map_error(e: &anyhow::Error) -> String {
    let mut rendered = e.to_string();
    for cause in e.chain().skip(1) {
        rendered.push_str("\n  caused by: ");
        rendered.push_str(&cause.to_string());
    }
    rendered
}

/// Process exit code for a failed command.
pub fn exit_code(e: &anyhow::Error) -> i32 {
    if e.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    match e.downcast_ref::<FootprintsError>() {
        Some(FootprintsError::Config(_)) => 2,
        Some(FootprintsError::FlushTimeout { .. }) => 3,
        _ => 1,
    }
}
