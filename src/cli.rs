//! CLI domain: parse, route and output only. Pipeline behavior lives in
//! [`crate::pipeline`].

mod output;
mod parse;
mod route;

pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands};
pub use route::{read_commands, ParsedInput, RunContext};
