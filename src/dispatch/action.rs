//! Built-in actions and their argument shapes.

use crate::error::DispatchError;
use serde_json::{Map, Value};

pub const USER_ID_KEY: &str = "userId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PageView,
    User,
    Context,
    Track,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::PageView, Action::User, Action::Context, Action::Track];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pageView" => Some(Action::PageView),
            "user" => Some(Action::User),
            "context" => Some(Action::Context),
            "track" => Some(Action::Track),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::PageView => "pageView",
            Action::User => "user",
            Action::Context => "context",
            Action::Track => "track",
        }
    }
}

fn invalid(action: &str, reason: impl Into<String>) -> DispatchError {
    DispatchError::InvalidArguments {
        action: action.to_string(),
        reason: reason.into(),
    }
}

fn optional_object(
    action: &str,
    value: Option<&Value>,
) -> Result<Map<String, Value>, DispatchError> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(invalid(
            action,
            format!("expected properties object, got {}", other),
        )),
    }
}

/// `(name?, properties?)`, shared by `pageView` and `track`. A leading object is
/// taken as the properties when no name is given.
pub fn name_and_properties(
    action: &str,
    args: &[Value],
) -> Result<(Option<String>, Map<String, Value>), DispatchError> {
    match args.first() {
        None | Some(Value::Null) => Ok((None, optional_object(action, args.get(1))?)),
        Some(Value::String(name)) => {
            Ok((Some(name.clone()), optional_object(action, args.get(1))?))
        }
        Some(Value::Object(props)) => {
            let mut props = props.clone();
            props.extend(optional_object(action, args.get(1))?);
            Ok((None, props))
        }
        Some(other) => Err(invalid(
            action,
            format!("expected a name or properties, got {}", other),
        )),
    }
}

/// Normalize `user(idOrProperties, properties?)` into a context partial.
///
/// An identifier is stored under `userId`. The legacy form
/// `user(id, name, email)` writes `name` and `email` as well.
pub fn user_partial(args: &[Value]) -> Result<Map<String, Value>, DispatchError> {
    let action = Action::User.name();
    let mut partial = Map::new();
    match args.first() {
        Some(Value::Object(props)) => {
            partial.extend(props.clone());
            partial.extend(optional_object(action, args.get(1))?);
        }
        Some(id @ (Value::String(_) | Value::Number(_))) => {
            partial.insert(USER_ID_KEY.to_string(), id.clone());
            match args.get(1) {
                Some(Value::String(name)) => {
                    partial.insert("name".to_string(), Value::String(name.clone()));
                    if let Some(email) = args.get(2) {
                        match email {
                            Value::String(_) | Value::Null => {
                                partial.insert("email".to_string(), email.clone());
                            }
                            other => {
                                let reason = format!("expected email, got {}", other);
                                return Err(invalid(action, reason));
                            }
                        }
                    }
                }
                other => partial.extend(optional_object(action, other)?),
            }
        }
        None | Some(Value::Null) => return Err(invalid(action, "missing user id or properties")),
        Some(other) => {
            let reason = format!("expected user id or properties, got {}", other);
            return Err(invalid(action, reason));
        }
    }
    Ok(partial)
}

/// `context(partial)`: exactly one properties object.
pub fn context_partial(args: &[Value]) -> Result<Map<String, Value>, DispatchError> {
    match args.first() {
        Some(Value::Object(partial)) => Ok(partial.clone()),
        Some(other) => Err(invalid(
            Action::Context.name(),
            format!("expected properties object, got {}", other),
        )),
        None => Err(invalid(Action::Context.name(), "missing properties object")),
    }
}
