//! Builders to construct dispatch components from configuration.

pub mod dispatcher_builder;

pub use dispatcher_builder::{
    build_dispatcher, build_from_env, build_from_lookup, default_channel_factory,
    default_queue_factory, ConfiguredDispatcher,
};
#[cfg(feature = "tokio-runtime")]
pub use dispatcher_builder::build_sweeper;
