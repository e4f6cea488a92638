//! Delivery: the queue of built events, the sender that ships them, and the
//! HTTP transport underneath.

pub mod queue;
pub mod sender;
pub mod transport;

pub use queue::{DeliveryQueue, DeliveryStats, Envelope};
pub use sender::{ErrorCallback, Sender, SenderConfig, SuccessCallback};
pub use transport::{classify_status, DeliveryReceipt, HttpTransport, Transport};
