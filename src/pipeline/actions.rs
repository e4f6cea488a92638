//! Convenience entry points for the built-in actions.
//!
//! Each one is shorthand for [`Footprints::push`] with the action's name.
//! Custom actions go through `push` directly.

use super::Footprints;
use crate::dispatch::Action;
use serde_json::{Map, Value};

fn name_args(name: Option<&str>, properties: Option<Map<String, Value>>) -> Vec<Value> {
    let mut args = Vec::with_capacity(2);
    args.push(name.map(|n| Value::String(n.to_string())).unwrap_or(Value::Null));
    if let Some(properties) = properties {
        args.push(Value::Object(properties));
    }
    args
}

impl Footprints {
    /// Record a page view. The page environment fills in url, path, referrer and title.
    pub fn page_view(&self, name: Option<&str>, properties: Option<Map<String, Value>>) {
        self.push(Action::PageView.name(), name_args(name, properties));
    }

    pub fn track(&self, event_name: Option<&str>, properties: Option<Map<String, Value>>) {
        self.push(Action::Track.name(), name_args(event_name, properties));
    }

    /// Identify the user. `id` is stored as `userId` in the context.
    pub fn user(&self, id: impl Into<Value>, properties: Option<Map<String, Value>>) {
        let mut args = vec![id.into()];
        if let Some(properties) = properties {
            args.push(Value::Object(properties));
        }
        self.push(Action::User.name(), args);
    }

    pub fn context(&self, partial: Map<String, Value>) {
        self.push(Action::Context.name(), vec![Value::Object(partial)]);
    }
}
