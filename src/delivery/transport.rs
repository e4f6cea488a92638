//! HTTP transport for event delivery.

use crate::error::{ConfigError, DeliveryError};
use crate::event::Event;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub event_id: String,
    pub status: u16,
}

/// One POST per event. Any 2xx is success; anything else is a failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, endpoint: &str, event: &Event) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Map a response status to the delivery outcome.
pub fn classify_status(
    event: &Event,
    status: u16,
    reason: &str,
) -> Result<DeliveryReceipt, DeliveryError> {
    if (200..300).contains(&status) {
        Ok(DeliveryReceipt {
            event_id: event.event_id().to_string(),
            status,
        })
    } else {
        Err(DeliveryError::Status {
            status,
            reason: reason.to_string(),
        })
    }
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(
        connect_timeout: Duration,
        request_timeout: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConfigError::InvalidOption {
                    name: "headers",
                    reason: format!("{}: {}", name, e),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidOption {
                name: "headers",
                reason: format!("{}: {}", name.as_str(), e),
            })?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ConfigError::Load(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, event: &Event) -> Result<DeliveryReceipt, DeliveryError> {
        let response = self.client.post(endpoint).json(event).send().await?;
        let status = response.status();
        classify_status(event, status.as_u16(), status.canonical_reason().unwrap_or(""))
    }
}
