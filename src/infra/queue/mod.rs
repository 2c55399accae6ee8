//! Pending queue backends.

pub mod file;
pub mod memory;

pub use file::FilePendingQueue;
pub use memory::InMemoryPendingQueue;
