//! Record store backends.

pub mod memory;

pub use memory::{InMemoryEventStore, InMemoryUserStore};
