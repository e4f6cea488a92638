//! Property-based tests for pipeline guarantees

mod context_merge;
mod event_stamps;
