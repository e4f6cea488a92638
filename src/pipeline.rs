//! Pipeline: scheduler and public entry surface.
//!
//! [`Footprints`] is a cheap-to-clone handle. Commands pushed before
//! [`Footprints::init`] are buffered and processed by the first cycle after it.
//! A cycle is: drain the command queue to empty, then run one bounded drain of
//! the delivery queue. Cycles are triggered by every push and by a periodic
//! timer; overlapping triggers are safe because the command drain is
//! single-entry and the delivery drain is bounded.

mod actions;
mod options;

pub use options::{PipelineOptions, ReadyCallback};

use crate::config::FootprintsConfig;
use crate::context::ContextStore;
use crate::delivery::{DeliveryQueue, Envelope, HttpTransport, Sender, SenderConfig, Transport};
use crate::dispatch::{
    Action, ActionRegistry, Command, CommandQueue, CustomHandler, Dispatcher, DrainReport,
    HandlerScope, PublishedContext,
};
use crate::error::{ConfigError, DispatchError, FootprintsError};
use crate::event::EventBuilder;
use crate::host::clock::format_timestamp;
use futures::channel::mpsc::{self, UnboundedSender};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

pub const PAGE_TIME_KEY: &str = "pageTime";

/// What one processing cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub commands: DrainReport,
    /// Events handed to the sender by the bounded delivery drain
    pub events_dispatched: usize,
}

/// Combined queue counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub pending_commands: usize,
    pub pending_events: usize,
    pub in_flight: usize,
    pub delivered: usize,
    pub failed_attempts: usize,
    pub dropped: usize,
}

/// State that exists only after a successful init.
struct Core {
    dispatcher: Mutex<Dispatcher>,
    context: PublishedContext,
    handoff: UnboundedSender<Envelope>,
    timer: Mutex<Option<JoinHandle<()>>>,
    interval: Duration,
}

struct Inner {
    commands: CommandQueue,
    outbox: DeliveryQueue,
    initialized: AtomicBool,
    stopped: AtomicBool,
    core: OnceLock<Core>,
    actions: ActionRegistry,
}

#[derive(Clone)]
pub struct Footprints {
    inner: Arc<Inner>,
}

impl Default for Footprints {
    fn default() -> Self {
        Self::new()
    }
}

impl Footprints {
    /// Uninitialized handle; pushes are buffered until [`Footprints::init`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                commands: CommandQueue::new(),
                outbox: DeliveryQueue::new(),
                initialized: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                core: OnceLock::new(),
                actions: ActionRegistry::new(),
            }),
        }
    }

    /// Create and initialize in one step.
    pub fn start(
        config: FootprintsConfig,
        options: PipelineOptions,
    ) -> Result<Self, FootprintsError> {
        let footprints = Self::new();
        footprints.init(config, options)?;
        Ok(footprints)
    }

    /// Validate the configuration, spawn the sender and the periodic timer on the
    /// current Tokio runtime, and process anything buffered so far.
    ///
    /// A second call on an initialized handle is a no-op.
    pub fn init(
        &self,
        config: FootprintsConfig,
        options: PipelineOptions,
    ) -> Result<(), FootprintsError> {
        let runtime = Handle::try_current().map_err(|_| FootprintsError::RuntimeUnavailable)?;
        self.init_with_runtime(config, options, &runtime)
    }

    pub fn init_with_runtime(
        &self,
        config: FootprintsConfig,
        options: PipelineOptions,
        runtime: &Handle,
    ) -> Result<(), FootprintsError> {
        if self
            .inner
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Footprints already initialized; ignoring init");
            return Ok(());
        }

        let core = match self.build_core(&config, &options, runtime) {
            Ok(core) => core,
            Err(err) => {
                self.inner.initialized.store(false, Ordering::Release);
                return Err(err.into());
            }
        };
        let interval = core.interval;
        if self.inner.core.set(core).is_err() {
            return Ok(());
        }
        self.spawn_timer(runtime, interval);

        info!(
            endpoint = %config.endpoint_url.as_deref().unwrap_or_default(),
            interval_ms = config.interval_wait_ms,
            buffered_commands = self.inner.commands.len(),
            "Footprints initialized"
        );
        self.process_cycle();
        (options.ready_callback)();
        Ok(())
    }

    fn build_core(
        &self,
        config: &FootprintsConfig,
        options: &PipelineOptions,
        runtime: &Handle,
    ) -> Result<Core, ConfigError> {
        config.validate()?;
        let endpoint = config.endpoint()?.to_string();

        let transport: Arc<dyn Transport> = match &options.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(HttpTransport::new(
                config.connect_timeout(),
                config.request_timeout(),
                &config.headers,
            )?),
        };

        let mut context = ContextStore::new();
        let page_time = config
            .page_time()?
            .unwrap_or_else(|| options.clock.now());
        context.set(PAGE_TIME_KEY, format_timestamp(page_time));

        let dispatcher = Dispatcher::new(
            context,
            EventBuilder::new(Arc::clone(&options.clock), Arc::clone(&options.id_generator)),
            Arc::clone(&options.payload_transform),
            Arc::clone(&options.page_environment),
            self.inner.outbox.clone(),
            config.debug,
        )
        .with_actions(self.inner.actions.clone());
        let context = dispatcher.published_context();

        let sender = Arc::new(Sender::new(
            SenderConfig {
                endpoint_url: endpoint,
                send_timeout: config.request_timeout(),
                max_in_flight: config.max_in_flight,
                max_attempts: config.max_attempts,
                debug: config.debug,
            },
            transport,
            self.inner.outbox.clone(),
            Arc::clone(&options.success_callback),
            Arc::clone(&options.error_callback),
        ));
        let (handoff, envelopes) = mpsc::unbounded();
        runtime.spawn(sender.run(envelopes));

        Ok(Core {
            dispatcher: Mutex::new(dispatcher),
            context,
            handoff,
            timer: Mutex::new(None),
            interval: config.interval_wait(),
        })
    }

    fn spawn_timer(&self, runtime: &Handle, interval: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                Footprints { inner }.process_cycle();
            }
        });
        if let Some(core) = self.inner.core.get() {
            *core.timer.lock() = Some(handle);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.core.get().is_some()
    }

    /// Enqueue a command and run a cycle immediately.
    pub fn push(&self, action: impl Into<String>, args: Vec<Value>) {
        self.push_command(Command::new(action, args));
    }

    pub fn push_command(&self, command: Command) {
        trace!(action = %command.action, "Command pushed");
        self.inner.commands.push(command);
        self.process_cycle();
    }

    /// Add an action to the dispatch table. Built-in names are rejected.
    ///
    /// Safe to call from inside a handler; the new action is visible to the
    /// next command dispatched.
    pub fn register_action<F>(&self, name: impl Into<String>, handler: F) -> Result<(), ConfigError>
    where
        F: Fn(&mut HandlerScope<'_>, &[Value]) -> Result<(), DispatchError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if Action::from_name(&name).is_some() {
            return Err(ConfigError::InvalidOption {
                name: "action",
                reason: format!("'{}' is a built-in action", name),
            });
        }
        let handler: CustomHandler = Arc::new(handler);
        self.inner.actions.register(name, handler);
        Ok(())
    }

    /// Drain the command queue, then run one bounded delivery drain.
    /// Does nothing before init or after shutdown.
    pub fn process_cycle(&self) -> CycleReport {
        let Some(core) = self.inner.core.get() else {
            return CycleReport::default();
        };
        if self.inner.stopped.load(Ordering::Acquire) {
            return CycleReport::default();
        }

        let commands = self.drain_commands(core);

        trace!("Processing output queue");
        let mut undelivered = Vec::new();
        let events_dispatched = self.inner.outbox.drain_cycle(|envelope| {
            if let Err(err) = core.handoff.unbounded_send(envelope) {
                undelivered.push(err.into_inner());
            }
        });
        if !undelivered.is_empty() {
            debug!(count = undelivered.len(), "Sender unavailable; events kept queued");
            self.inner.outbox.restore(undelivered);
        }

        CycleReport {
            commands,
            events_dispatched,
        }
    }

    /// Single-entry command drain. A caller that finds a drain already running
    /// leaves its command to that drain, which keeps going until the queue is
    /// empty; the re-check after unlocking catches pushes that raced the exit.
    fn drain_commands(&self, core: &Core) -> DrainReport {
        let mut total = DrainReport::default();
        loop {
            let Some(mut dispatcher) = core.dispatcher.try_lock() else {
                break;
            };
            let report = dispatcher.drain(&self.inner.commands);
            drop(dispatcher);
            total.dispatched += report.dispatched;
            total.failed += report.failed;
            if self.inner.commands.is_empty() {
                break;
            }
        }
        total
    }

    /// Copy of the context as of the last merge. Never waits for a drain, so
    /// handlers may call it too.
    pub fn context_snapshot(&self) -> Map<String, Value> {
        match self.inner.core.get() {
            Some(core) => core.context.read().clone(),
            None => Map::new(),
        }
    }

    pub fn stats(&self) -> PipelineStats {
        let delivery = self.inner.outbox.stats();
        PipelineStats {
            pending_commands: self.inner.commands.len(),
            pending_events: delivery.pending,
            in_flight: delivery.in_flight,
            delivered: delivery.delivered,
            failed_attempts: delivery.failed_attempts,
            dropped: delivery.dropped,
        }
    }

    /// Run a cycle, then wait until nothing is queued or in flight. Retries keep
    /// following the timer cadence.
    pub async fn flush(&self, timeout: Duration) -> Result<(), FootprintsError> {
        let Some(core) = self.inner.core.get() else {
            return Err(FootprintsError::NotStarted);
        };
        let poll = core.interval.min(Duration::from_millis(25));
        let start = Instant::now();
        self.process_cycle();
        loop {
            let stats = self.stats();
            if stats.pending_commands == 0 && stats.pending_events == 0 && stats.in_flight == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(FootprintsError::FlushTimeout {
                    timeout,
                    pending: stats.pending_events,
                    in_flight: stats.in_flight,
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Stop the periodic timer and the sender. Queued events stay in memory and
    /// are not sent.
    pub fn shutdown(&self) {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(core) = self.inner.core.get() {
            if let Some(timer) = core.timer.lock().take() {
                timer.abort();
            }
            core.handoff.close_channel();
        }
        info!(pending_events = self.inner.outbox.len(), "Footprints stopped");
    }
}
