//! # Prometheus Notify
//!
//! Availability-aware event dispatch for user populations with weekly schedules.
//!
//! Every user carries a personal weekly availability schedule. When an event is raised,
//! users who are currently *active* (inside one of their scheduled windows) receive it
//! immediately over a per-user push channel; everyone else gets a durable pending entry.
//! A periodic sweep re-evaluates activity and flushes pending entries to users who have
//! since become active.
//!
//! ## Core Problem Solved
//!
//! - **Quiet hours**: Don't push to people outside the hours they asked for
//! - **No lost events**: Anything not delivered right away is parked until the user is reachable
//! - **Failure isolation**: One user's corrupt schedule or dead transport never stalls the others
//! - **Readable schedules**: Weekly schedules compact into a short human-facing description
//!
//! ## Architecture
//!
//! ```text
//! create_event ─► EventStore::insert ─► EventDispatcher::dispatch
//!                                          ├── active   ─► PushChannel::send + audit
//!                                          └── inactive ─► PendingQueue::insert
//!
//! Sweeper (tokio interval, initial delay)
//!   └── tick ─► scan all users ─► one flush task per active user (Spawn)
//!                                   └── PendingQueue::find_by_user
//!                                         ─► EventStore::find_by_id ─► push ─► delete
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_notify::core::{EventDispatcher, Sweeper};
//! use prometheus_notify::infra::{InMemoryEventStore, InMemoryPendingQueue, InMemoryPushChannel, InMemoryUserStore};
//! use prometheus_notify::runtime::TokioSpawner;
//! use prometheus_notify::config::SweepConfig;
//! use prometheus_notify::util::SystemClock;
//!
//! let dispatcher = EventDispatcher::new(
//!     Arc::new(InMemoryUserStore::new()),
//!     Arc::new(InMemoryEventStore::new()),
//!     InMemoryPendingQueue::new(10_000),
//!     Arc::new(InMemoryPushChannel::new()),
//!     Arc::new(SystemClock),
//! );
//!
//! let event = dispatcher.create_event("Server maintenance at 22:00".into()).await?;
//! let sweeper = Sweeper::new(dispatcher, TokioSpawner::current(), SweepConfig::default());
//! let handle = sweeper.start();
//! ```
//!
//! For complete examples, see:
//! - `tests/dispatch_flow_test.rs` - dispatch/flush round trips and isolation
//! - `tests/sweeper_test.rs` - periodic sweep behaviour

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Schedule model, dispatch engine, and sweep controller.
pub mod core;
/// Configuration models for the sweep and backends.
pub mod config;
/// Builders to construct dispatch components from configuration.
pub mod builders;
/// Infrastructure adapters for queues, push channels, and stores.
pub mod infra;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
