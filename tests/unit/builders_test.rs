//! Tests for builder modules

use std::sync::Arc;

use prometheus_notify::builders::{build_dispatcher, build_sweeper, default_channel_factory, default_queue_factory};
use prometheus_notify::config::ServiceConfig;
use prometheus_notify::core::{NotifyError, PendingQueue, PushChannel};
use prometheus_notify::infra::{InMemoryEventStore, InMemoryPendingQueue, InMemoryUserStore, SessionPushChannel};
use prometheus_notify::runtime::TokioSpawner;
use prometheus_notify::util::SystemClock;

#[test]
fn test_build_with_custom_factories() {
    let session = Arc::new(SessionPushChannel::new());
    let channel = Arc::clone(&session);

    let dispatcher = build_dispatcher(
        &ServiceConfig::default(),
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryEventStore::new()),
        Arc::new(SystemClock),
        |cfg| Ok(Box::new(InMemoryPendingQueue::new(cfg.max_queue_depth)) as Box<dyn PendingQueue>),
        move |_| Ok(channel as Arc<dyn PushChannel>),
    )
    .unwrap();

    assert_eq!(dispatcher.pending_count(), 0);
    assert_eq!(session.session_count(1), 0);
}

#[test]
fn test_factory_error_propagates() {
    let result = build_dispatcher(
        &ServiceConfig::default(),
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryEventStore::new()),
        Arc::new(SystemClock),
        |_| Err(NotifyError::Backend("queue unavailable".into())),
        default_channel_factory,
    );
    assert!(matches!(result, Err(NotifyError::Backend(msg)) if msg == "queue unavailable"));
}

#[tokio::test]
async fn test_build_sweeper_uses_sweep_config() {
    let mut cfg = ServiceConfig::default();
    cfg.sweep.period_secs = 42;

    let dispatcher = build_dispatcher(
        &cfg,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryEventStore::new()),
        Arc::new(SystemClock),
        default_queue_factory,
        default_channel_factory,
    )
    .unwrap();
    let sweeper = build_sweeper(&cfg, dispatcher, TokioSpawner::current());
    assert_eq!(sweeper.config().period_secs, 42);
}
