//! Configuration models for the sweep and backends.

pub mod service;

pub use service::{PushBackendConfig, QueueBackendConfig, ServiceConfig, SweepConfig};
