//! Integration tests for the Footprints telemetry pipeline

mod config_integration;
mod delivery_retry;
mod pipeline_scenarios;
