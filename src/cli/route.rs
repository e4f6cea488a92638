//! CLI route: run context and command dispatch.

use crate::cli::parse::Commands;
use crate::config::{ConfigLoader, FootprintsConfig};
use crate::dispatch::Command;
use crate::error::ConfigError;
use crate::pipeline::{Footprints, PipelineOptions};
use anyhow::Context as _;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Commands parsed from line-oriented input, plus the lines that were rejected.
#[derive(Debug, Default)]
pub struct ParsedInput {
    pub commands: Vec<Command>,
    /// `(line number, reason)`, 1-based
    pub rejected: Vec<(usize, String)>,
}

/// Parse one JSON array command per line. Blank lines are ignored.
pub fn read_commands<R: BufRead>(reader: R) -> std::io::Result<ParsedInput> {
    let mut parsed = ParsedInput::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                parsed.rejected.push((index + 1, e.to_string()));
                continue;
            }
        };
        match Command::from_array(value) {
            Some(command) => parsed.commands.push(command),
            None => parsed
                .rejected
                .push((index + 1, "expected [\"action\", ...args]".to_string())),
        }
    }
    Ok(parsed)
}

/// Runtime context for CLI execution: the resolved configuration.
pub struct RunContext {
    config: FootprintsConfig,
}

impl RunContext {
    /// Load configuration from `config_path` or the layered sources under `root`,
    /// then apply flag overrides.
    pub fn new(
        root: PathBuf,
        config_path: Option<PathBuf>,
        endpoint: Option<String>,
        debug: bool,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&root)?,
        };
        if endpoint.is_some() {
            config.endpoint_url = endpoint;
        }
        config.debug |= debug;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FootprintsConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> anyhow::Result<String> {
        match command {
            Commands::Config => Ok(serde_json::to_string_pretty(&self.config)?),
            Commands::Validate => {
                self.config.validate()?;
                Ok("configuration is valid".to_string())
            }
            Commands::Send {
                input,
                flush_timeout_ms,
            } => {
                let parsed = match input {
                    Some(path) => {
                        let file = std::fs::File::open(path)
                            .with_context(|| format!("failed to open {}", path.display()))?;
                        read_commands(BufReader::new(file))?
                    }
                    None => read_commands(std::io::stdin().lock())?,
                };
                for (line, reason) in &parsed.rejected {
                    warn!(line, reason = %reason, "Skipping input line");
                }
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .context("failed to start async runtime")?;
                runtime.block_on(self.send(parsed, Duration::from_millis(*flush_timeout_ms)))
            }
        }
    }

    async fn send(&self, parsed: ParsedInput, flush_timeout: Duration) -> anyhow::Result<String> {
        let delivered = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));
        let options = {
            let delivered = Arc::clone(&delivered);
            let failures = Arc::clone(&failures);
            PipelineOptions::new()
                .on_success(move |_| {
                    delivered.fetch_add(1, Ordering::Relaxed);
                })
                .on_error(move |_| {
                    failures.fetch_add(1, Ordering::Relaxed);
                })
        };

        let footprints = Footprints::start(self.config.clone(), options)?;
        let pushed = parsed.commands.len();
        for command in parsed.commands {
            footprints.push_command(command);
        }
        info!(commands = pushed, "Input pushed; flushing");

        let flushed = footprints.flush(flush_timeout).await;
        footprints.shutdown();
        flushed?;

        let stats = footprints.stats();
        Ok(format!(
            "{} commands, {} events delivered, {} failed attempts, {} dropped, {} lines skipped",
            pushed,
            delivered.load(Ordering::Relaxed),
            failures.load(Ordering::Relaxed),
            stats.dropped,
            parsed.rejected.len()
        ))
    }
}
