//! Page-environment accessor.
//!
//! Each field is looked up independently and best-effort. `Ok(None)` means the
//! host has nothing to report; `Err` means the lookup itself failed and is worth
//! reporting. Neither aborts a `pageView`.

use crate::error::HostError;
use parking_lot::RwLock;
use serde_json::{Map, Value};

pub trait PageEnvironment: Send + Sync {
    fn url(&self) -> Result<Option<String>, HostError>;
    fn path(&self) -> Result<Option<String>, HostError>;
    fn referrer(&self) -> Result<Option<String>, HostError>;
    fn title(&self) -> Result<Option<String>, HostError>;
}

/// Fields collected from a page environment plus the lookups that failed.
#[derive(Debug, Default)]
pub struct PageSnapshot {
    pub properties: Map<String, Value>,
    pub failures: Vec<HostError>,
}

impl PageSnapshot {
    /// Query every field of `env`, keeping whatever succeeds.
    pub fn collect(env: &dyn PageEnvironment) -> Self {
        let mut snapshot = PageSnapshot::default();
        snapshot.record("url", env.url());
        snapshot.record("path", env.path());
        snapshot.record("referrer", env.referrer());
        snapshot.record("title", env.title());
        snapshot
    }

    fn record(&mut self, key: &str, lookup: Result<Option<String>, HostError>) {
        match lookup {
            Ok(Some(value)) => {
                self.properties.insert(key.to_string(), Value::String(value));
            }
            Ok(None) => {}
            Err(err) => self.failures.push(err),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PageFields {
    url: Option<String>,
    path: Option<String>,
    referrer: Option<String>,
    title: Option<String>,
}

/// Page environment backed by values the host sets as navigation happens.
#[derive(Debug, Default)]
pub struct StaticPageEnvironment {
    fields: RwLock<PageFields>,
}

impl StaticPageEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.fields.write().url = Some(url.into());
        self
    }

    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.fields.write().path = Some(path.into());
        self
    }

    pub fn with_referrer(self, referrer: impl Into<String>) -> Self {
        self.fields.write().referrer = Some(referrer.into());
        self
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.fields.write().title = Some(title.into());
        self
    }

    /// Record a navigation; `referrer` becomes the previous url.
    pub fn navigate(&self, url: impl Into<String>, path: impl Into<String>, title: Option<String>) {
        let mut fields = self.fields.write();
        fields.referrer = fields.url.take();
        fields.url = Some(url.into());
        fields.path = Some(path.into());
        fields.title = title;
    }
}

impl PageEnvironment for StaticPageEnvironment {
    fn url(&self) -> Result<Option<String>, HostError> {
        Ok(self.fields.read().url.clone())
    }

    fn path(&self) -> Result<Option<String>, HostError> {
        Ok(self.fields.read().path.clone())
    }

    fn referrer(&self) -> Result<Option<String>, HostError> {
        Ok(self.fields.read().referrer.clone())
    }

    fn title(&self) -> Result<Option<String>, HostError> {
        Ok(self.fields.read().title.clone())
    }
}
