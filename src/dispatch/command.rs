//! Commands and the shared command queue.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// One caller action: a name plus positional arguments. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub action: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Command {
    pub fn new(action: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            action: action.into(),
            args,
        }
    }

    /// Parse the snippet form `["action", arg1, arg2, ...]`.
    pub fn from_array(value: Value) -> Option<Self> {
        let Value::Array(mut items) = value else {
            return None;
        };
        if items.is_empty() {
            return None;
        }
        let Value::String(action) = items.remove(0) else {
            return None;
        };
        Some(Self::new(action, items))
    }
}

/// FIFO of pending commands, shared between the entry surface and the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<Command>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: Command) {
        self.inner.lock().push_back(command);
    }

    pub fn pop(&self) -> Option<Command> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
