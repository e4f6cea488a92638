//! Runtime options: callbacks and host collaborators.

use crate::delivery::{DeliveryReceipt, ErrorCallback, SuccessCallback, Transport};
use crate::error::DeliveryError;
use crate::event::{identity_transform, PayloadTransform};
use crate::host::{
    Clock, IdGenerator, PageEnvironment, StaticPageEnvironment, SystemClock, UuidV7Generator,
};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub type ReadyCallback = Arc<dyn Fn() + Send + Sync>;

/// Everything the pipeline needs besides [`crate::config::FootprintsConfig`].
/// Every field has a working default.
#[derive(Clone)]
pub struct PipelineOptions {
    pub success_callback: SuccessCallback,
    pub error_callback: ErrorCallback,
    pub ready_callback: ReadyCallback,
    pub id_generator: Arc<dyn IdGenerator>,
    pub payload_transform: PayloadTransform,
    pub clock: Arc<dyn Clock>,
    pub page_environment: Arc<dyn PageEnvironment>,
    /// `None` builds the HTTP transport from the config.
    pub transport: Option<Arc<dyn Transport>>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            success_callback: Arc::new(|_: &DeliveryReceipt| {}),
            error_callback: Arc::new(|_: &DeliveryError| {}),
            ready_callback: Arc::new(|| {}),
            id_generator: Arc::new(UuidV7Generator),
            payload_transform: identity_transform(),
            clock: Arc::new(SystemClock),
            page_environment: Arc::new(StaticPageEnvironment::new()),
            transport: None,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DeliveryReceipt) + Send + Sync + 'static,
    {
        self.success_callback = Arc::new(callback);
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DeliveryError) + Send + Sync + 'static,
    {
        self.error_callback = Arc::new(callback);
        self
    }

    pub fn on_ready<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.ready_callback = Arc::new(callback);
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = ids;
        self
    }

    pub fn with_payload_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.payload_transform = Arc::new(transform);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_page_environment(mut self, page: Arc<dyn PageEnvironment>) -> Self {
        self.page_environment = page;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}
