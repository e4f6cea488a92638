//! Command Dispatcher
//!
//! Drains the command queue to empty, routing each command to its handler. The
//! built-in actions (`pageView`, `user`, `context`, `track`) are matched
//! exhaustively; other names go through the registry of custom handlers. An
//! unknown name or bad arguments is reported and skipped, never fatal.
//!
//! Every event-producing handler funnels through [`HandlerScope::fire`].

pub mod action;
pub mod command;

pub use action::{Action, USER_ID_KEY};
pub use command::{Command, CommandQueue};

use crate::context::ContextStore;
use crate::delivery::DeliveryQueue;
use crate::error::DispatchError;
use crate::event::{EventBuilder, EventType, PayloadTransform};
use crate::host::{PageEnvironment, PageSnapshot};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Handler for an action outside the built-in set.
pub type CustomHandler =
    Arc<dyn Fn(&mut HandlerScope<'_>, &[Value]) -> Result<(), DispatchError> + Send + Sync>;

/// Custom actions, shared between the dispatcher and whoever registers them.
/// Registration never waits for a drain in progress.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: Arc<RwLock<HashMap<String, CustomHandler>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a custom action. Built-in names are refused.
    pub fn register(&self, name: impl Into<String>, handler: CustomHandler) -> bool {
        let name = name.into();
        if Action::from_name(&name).is_some() {
            return false;
        }
        self.handlers.write().insert(name, handler);
        true
    }

    pub fn get(&self, name: &str) -> Option<CustomHandler> {
        self.handlers.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }
}

/// Copy of the context refreshed after every merge, readable while a drain
/// holds the dispatcher.
pub type PublishedContext = Arc<RwLock<Map<String, Value>>>;

/// Result of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub dispatched: usize,
    pub failed: usize,
}

/// What a handler may touch while it runs.
pub struct HandlerScope<'a> {
    context: &'a mut ContextStore,
    published: &'a RwLock<Map<String, Value>>,
    builder: &'a EventBuilder,
    transform: &'a PayloadTransform,
    page: &'a dyn PageEnvironment,
    outbox: &'a DeliveryQueue,
    commands: &'a CommandQueue,
    debug: bool,
}

impl<'a> HandlerScope<'a> {
    /// Stamp an event of `event_type` over `properties`, run the payload
    /// transform on the stamped document and queue it for delivery.
    pub fn fire(&mut self, event_type: EventType, properties: Map<String, Value>) {
        let event = self
            .builder
            .build(event_type, properties)
            .transformed(self.transform);
        debug!(
            event_id = %event.event_id(),
            event_type = %event.event_type(),
            "Event queued"
        );
        self.outbox.push(event);
    }

    pub fn merge_context(&mut self, partial: Map<String, Value>) {
        trace!(keys = ?partial.keys().collect::<Vec<_>>(), "Merging context");
        self.context.merge(partial);
        *self.published.write() = self.context.snapshot();
    }

    pub fn context(&self) -> &ContextStore {
        self.context
    }

    /// Queue a follow-up command; the current drain will process it.
    pub fn enqueue(&mut self, command: Command) {
        self.commands.push(command);
    }

    fn page_view(&mut self, args: &[Value]) -> Result<(), DispatchError> {
        let (name, caller) = action::name_and_properties(Action::PageView.name(), args)?;
        let mut properties = self.context.snapshot();

        let page = PageSnapshot::collect(self.page);
        if self.debug {
            for failure in &page.failures {
                warn!(error = %failure, "Page environment lookup failed");
            }
        }
        properties.extend(page.properties);
        properties.extend(caller);
        if let Some(name) = name {
            properties.insert("name".to_string(), Value::String(name));
        }
        self.fire(EventType::PageView, properties);
        Ok(())
    }

    fn track(&mut self, args: &[Value]) -> Result<(), DispatchError> {
        let (event_name, caller) = action::name_and_properties(Action::Track.name(), args)?;
        let mut properties = self.context.snapshot();
        properties.extend(caller);
        if let Some(event_name) = event_name {
            properties.insert("eventName".to_string(), Value::String(event_name));
        }
        self.fire(EventType::Track, properties);
        Ok(())
    }

    fn user(&mut self, args: &[Value]) -> Result<(), DispatchError> {
        let partial = action::user_partial(args)?;
        self.merge_context(partial);
        Ok(())
    }

    fn context_action(&mut self, args: &[Value]) -> Result<(), DispatchError> {
        let partial = action::context_partial(args)?;
        self.merge_context(partial);
        Ok(())
    }
}

pub struct Dispatcher {
    context: ContextStore,
    published: PublishedContext,
    builder: EventBuilder,
    transform: PayloadTransform,
    page: Arc<dyn PageEnvironment>,
    outbox: DeliveryQueue,
    actions: ActionRegistry,
    debug: bool,
}

impl Dispatcher {
    pub fn new(
        context: ContextStore,
        builder: EventBuilder,
        transform: PayloadTransform,
        page: Arc<dyn PageEnvironment>,
        outbox: DeliveryQueue,
        debug: bool,
    ) -> Self {
        Self {
            published: Arc::new(RwLock::new(context.snapshot())),
            context,
            builder,
            transform,
            page,
            outbox,
            actions: ActionRegistry::new(),
            debug,
        }
    }

    /// Use `actions` as the custom action table.
    pub fn with_actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    /// Extend the dispatch table. Built-in names cannot be replaced.
    pub fn register(&mut self, name: impl Into<String>, handler: CustomHandler) -> bool {
        self.actions.register(name, handler)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        Action::from_name(name).is_some() || self.actions.contains(name)
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    /// Shared copy of the context for readers outside the drain.
    pub fn published_context(&self) -> PublishedContext {
        Arc::clone(&self.published)
    }

    pub fn merge_context(&mut self, partial: Map<String, Value>) {
        self.context.merge(partial);
        *self.published.write() = self.context.snapshot();
    }

    /// Pop and dispatch until `commands` is empty, including commands enqueued by
    /// handlers during this drain.
    pub fn drain(&mut self, commands: &CommandQueue) -> DrainReport {
        trace!("Processing input queue");
        let mut report = DrainReport::default();
        while let Some(command) = commands.pop() {
            report.dispatched += 1;
            if let Err(err) = self.dispatch(commands, &command) {
                report.failed += 1;
                if self.debug {
                    error!(action = %command.action, error = %err, "Command failed");
                }
            }
        }
        report
    }

    /// Route one command to its handler.
    pub fn dispatch(
        &mut self,
        commands: &CommandQueue,
        command: &Command,
    ) -> Result<(), DispatchError> {
        trace!(action = %command.action, args = command.args.len(), "Processing action");
        let builtin = Action::from_name(&command.action);
        let custom = match builtin {
            Some(_) => None,
            None => Some(
                self.actions
                    .get(&command.action)
                    .ok_or_else(|| DispatchError::UnknownAction(command.action.clone()))?,
            ),
        };

        let mut scope = HandlerScope {
            context: &mut self.context,
            published: &self.published,
            builder: &self.builder,
            transform: &self.transform,
            page: self.page.as_ref(),
            outbox: &self.outbox,
            commands,
            debug: self.debug,
        };

        match (builtin, custom) {
            (Some(Action::PageView), _) => scope.page_view(&command.args),
            (Some(Action::User), _) => scope.user(&command.args),
            (Some(Action::Context), _) => scope.context_action(&command.args),
            (Some(Action::Track), _) => scope.track(&command.args),
            (None, Some(handler)) => handler(&mut scope, &command.args),
            (None, None) => Err(DispatchError::UnknownAction(command.action.clone())),
        }
    }
}
