//! Host-provided collaborators: clock, unique-id generator, page environment.
//!
//! The pipeline never reaches for wall-clock time, randomness, or the page
//! directly; everything goes through these traits so a host (or a test) can
//! substitute its own.

pub mod clock;
pub mod ids;
pub mod page;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidV7Generator};
pub use page::{PageEnvironment, PageSnapshot, StaticPageEnvironment};
