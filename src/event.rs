//! Event record and builder.
//!
//! An [`Event`] is one flat JSON document: the merged properties plus the stamp
//! fields (`eventType`, `eventId`, `eventTime`). The payload transform gets the
//! stamped document once; after that the event is immutable.

use crate::host::{Clock, IdGenerator};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub const EVENT_TYPE_FIELD: &str = "eventType";
pub const EVENT_ID_FIELD: &str = "eventId";
pub const EVENT_TIME_FIELD: &str = "eventTime";

/// Discriminator carried as `eventType`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    PageView,
    Track,
    Custom(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::PageView => "pageView",
            EventType::Track => "track",
            EventType::Custom(name) => name,
        }
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        match value {
            "pageView" => EventType::PageView,
            "track" => EventType::Track,
            other => EventType::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rewrite of the stamped wire document, applied just before the event is queued.
pub type PayloadTransform = Arc<dyn Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync>;

pub fn identity_transform() -> PayloadTransform {
    Arc::new(|properties| properties)
}

/// A built event. The stamps are kept alongside the wire document so receipts and
/// logs can name the event even if a transform rewrote the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: EventType,
    event_id: String,
    event_time: String,
    document: Map<String, Value>,
}

impl Event {
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_time(&self) -> &str {
        &self.event_time
    }

    /// Field of the wire document.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Flat wire document.
    pub fn to_document(&self) -> Value {
        Value::Object(self.document.clone())
    }

    /// Run `transform` over the whole stamped document. Consumes the event, so
    /// the result is the last version anyone sees.
    pub fn transformed(mut self, transform: &PayloadTransform) -> Self {
        self.document = transform(std::mem::take(&mut self.document));
        self
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.document.len()))?;
        for (key, value) in &self.document {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Pure `(eventType, mergedProperties) -> Event`. Time and ids come from the
/// injected collaborators, so a fixed clock and id generator give a fixed event.
#[derive(Clone)]
pub struct EventBuilder {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl EventBuilder {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// Stamp `eventType`, `eventId` and `eventTime` over `properties`. Caller
    /// copies of the stamp keys are replaced.
    pub fn build(&self, event_type: EventType, mut document: Map<String, Value>) -> Event {
        let event_id = self.ids.next_id();
        let event_time = self.clock.now_iso();
        document.insert(
            EVENT_TYPE_FIELD.to_string(),
            Value::String(event_type.as_str().to_string()),
        );
        document.insert(EVENT_ID_FIELD.to_string(), Value::String(event_id.clone()));
        document.insert(EVENT_TIME_FIELD.to_string(), Value::String(event_time.clone()));
        Event {
            event_type,
            event_id,
            event_time,
            document,
        }
    }
}

impl fmt::Debug for EventBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBuilder").finish_non_exhaustive()
    }
}
