//! Tests for configuration validation

use prometheus_notify::config::{PushBackendConfig, QueueBackendConfig, ServiceConfig, SweepConfig};

#[test]
fn test_sweep_config_defaults() {
    let cfg = SweepConfig::default();
    assert_eq!(cfg.period_secs, 600);
    assert_eq!(cfg.initial_delay_ms, 1);
    assert!(cfg.max_concurrent_flushes >= 1);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_sweep_config_invalid_period() {
    let invalid = SweepConfig {
        period_secs: 0,
        ..SweepConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_service_config_from_json() {
    let json = r#"{
        "sweep": {"initial_delay_ms": 500, "period_secs": 60, "max_concurrent_flushes": 4},
        "queue": "file",
        "push": "in_memory",
        "data_dir": "/tmp/notify",
        "max_queue_depth": 50
    }"#;
    let cfg = ServiceConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.sweep.max_concurrent_flushes, 4);
    assert!(cfg.sweep.skip_in_flight_users);
    assert_eq!(cfg.queue, QueueBackendConfig::File);
    assert_eq!(cfg.push, PushBackendConfig::InMemory);
    assert_eq!(cfg.max_queue_depth, 50);
}

#[test]
fn test_service_config_parse_error() {
    let err = ServiceConfig::from_json_str("{not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_unknown_backend_rejected() {
    assert!(ServiceConfig::from_json_str(r#"{"push":"carrier_pigeon"}"#).is_err());
    assert!("carrier_pigeon".parse::<PushBackendConfig>().is_err());
    assert_eq!("Session".parse::<PushBackendConfig>(), Ok(PushBackendConfig::Session));
}
