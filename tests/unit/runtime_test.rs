//! Tests for tokio spawner utilities and API helpers

use prometheus_notify::core::{NotifyError, Spawn, UserStore};
use prometheus_notify::infra::InMemoryUserStore;
use prometheus_notify::runtime::tokio_spawner::TokioSpawner;
use prometheus_notify::runtime::{
    find_user, health, list_users, register_user, update_user, UserRequest,
};
use serde_json::json;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_try_current_outside_runtime() {
    assert!(TokioSpawner::try_current().is_err());
}

#[test]
fn test_list_users_renders_schedules() {
    let store = InMemoryUserStore::new();
    register_user(
        &store,
        UserRequest {
            full_name: "Пётр".into(),
            notification_schedule: Some(json!({"SATURDAY": ["10:00-12:00"]})),
        },
    )
    .unwrap();
    register_user(
        &store,
        UserRequest {
            full_name: "Нина".into(),
            notification_schedule: None,
        },
    )
    .unwrap();

    let users = list_users(&store).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(
        users[0].notification_schedule.as_deref(),
        Some("суббота с 10:00 до 12:00")
    );
    assert_eq!(users[1].notification_schedule, None);
    assert!(find_user(&store, 99).unwrap().is_none());
}

#[test]
fn test_unpadded_interval_is_refused_before_storing() {
    let store = InMemoryUserStore::new();
    for bad in ["9:00-18:00", "09:00-18:00 "] {
        let err = register_user(
            &store,
            UserRequest {
                full_name: "Лев".into(),
                notification_schedule: Some(json!({"monday": [bad]})),
            },
        )
        .unwrap_err();
        assert!(matches!(err, NotifyError::Validation(_)), "{bad}: {err:?}");
    }
    assert!(store.list_all().unwrap().is_empty());

    let kept = register_user(
        &store,
        UserRequest {
            full_name: "Вера".into(),
            notification_schedule: Some(json!({"monday": ["09:00-18:00"]})),
        },
    )
    .unwrap();
    let err = update_user(
        &store,
        kept.id,
        UserRequest {
            full_name: "Вера".into(),
            notification_schedule: Some(json!({"monday": ["9:00-18:00"]})),
        },
    )
    .unwrap_err();
    assert!(matches!(err, NotifyError::Validation(_)));

    let users = list_users(&store).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(
        users[0].notification_schedule.as_deref(),
        Some("понедельник с 09:00 до 18:00")
    );
}

#[test]
fn test_health() {
    assert!(health().ok);
}
