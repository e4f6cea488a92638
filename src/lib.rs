//! Footprints: Client-Side Telemetry Shipper
//!
//! Applications push commands (`pageView`, `user`, `context`, `track`, or
//! registered custom actions). The pipeline folds context updates into a shared
//! store, builds stamped events enriched with that context and the page
//! environment, and delivers each event to a collection endpoint, requeueing it
//! after every failed attempt.
//!
//! ```no_run
//! use footprints::{Footprints, FootprintsConfig, PipelineOptions};
//!
//! # async fn run() -> Result<(), footprints::FootprintsError> {
//! let footprints = Footprints::start(
//!     FootprintsConfig::with_endpoint("https://collector.example.com/events"),
//!     PipelineOptions::default(),
//! )?;
//! footprints.user("u-42", None);
//! footprints.page_view(Some("Pricing"), None);
//! footprints.flush(std::time::Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod host;
pub mod logging;
pub mod pipeline;

pub use config::{ConfigLoader, FootprintsConfig};
pub use context::ContextStore;
pub use delivery::{DeliveryReceipt, DeliveryStats, HttpTransport, Transport};
pub use dispatch::{Command, HandlerScope};
pub use error::{ConfigError, DeliveryError, DispatchError, FootprintsError, HostError};
pub use event::{Event, EventType};
pub use pipeline::{CycleReport, Footprints, PipelineOptions, PipelineStats};
