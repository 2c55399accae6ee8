//! Service, sweep, and backend configuration structures.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pending queue backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackendConfig {
    /// In-memory queue for development/testing.
    #[default]
    InMemory,
    /// JSON-lines file queue under `data_dir`.
    File,
}

/// Push channel backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushBackendConfig {
    /// In-memory outbox.
    #[default]
    InMemory,
    /// JSON-lines file outbox under `data_dir`.
    File,
    /// Live per-user session fan-out.
    Session,
}

impl FromStr for QueueBackendConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(Self::InMemory),
            "file" => Ok(Self::File),
            other => Err(format!("unknown queue backend `{other}`")),
        }
    }
}

impl FromStr for PushBackendConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(Self::InMemory),
            "file" => Ok(Self::File),
            "session" => Ok(Self::Session),
            other => Err(format!("unknown push backend `{other}`")),
        }
    }
}

/// Periodic sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Delay before the first tick, in milliseconds.
    pub initial_delay_ms: u64,
    /// Fixed period between ticks, in seconds.
    pub period_secs: u64,
    /// Maximum user flushes running at once within one tick.
    ///
    /// Each tick gets its own permits. A push that never returns pins one permit of
    /// its tick, so once this many pushes hang the rest of that tick waits with them;
    /// later ticks are unaffected and skip the stuck users while
    /// `skip_in_flight_users` is set.
    pub max_concurrent_flushes: usize,
    /// Skip users whose flush from an earlier tick has not finished.
    pub skip_in_flight_users: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1,
            period_secs: 600,
            max_concurrent_flushes: num_cpus::get(),
            skip_in_flight_users: true,
        }
    }
}

impl SweepConfig {
    /// Delay before the first tick.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Period between ticks.
    #[must_use]
    pub const fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    /// Validate sweep configuration values.
    ///
    /// # Errors
    ///
    /// A message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.period_secs == 0 {
            return Err("period_secs must be greater than 0".into());
        }
        if self.max_concurrent_flushes == 0 {
            return Err("max_concurrent_flushes must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Sweep timing and concurrency.
    pub sweep: SweepConfig,
    /// Pending queue backend.
    pub queue: QueueBackendConfig,
    /// Push channel backend.
    pub push: PushBackendConfig,
    /// Directory for file backends and the audit file.
    pub data_dir: Option<PathBuf>,
    /// Maximum pending entries before inserts are rejected.
    pub max_queue_depth: usize,
    /// In-memory audit records kept; 0 disables auditing.
    pub audit_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sweep: SweepConfig::default(),
            queue: QueueBackendConfig::InMemory,
            push: PushBackendConfig::InMemory,
            data_dir: None,
            max_queue_depth: 100_000,
            audit_capacity: 1_000,
        }
    }
}

impl ServiceConfig {
    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// A message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        self.sweep
            .validate()
            .map_err(|e| format!("sweep invalid: {e}"))?;
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        let needs_dir =
            self.queue == QueueBackendConfig::File || self.push == PushBackendConfig::File;
        if needs_dir && self.data_dir.is_none() {
            return Err("data_dir is required for file backends".into());
        }
        Ok(())
    }

    /// Parse service configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `NOTIFY_*` environment variables over the defaults.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Errors
    ///
    /// A variable that does not parse, or validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary `NOTIFY_*` variable source.
    ///
    /// # Errors
    ///
    /// A variable that does not parse, or validation failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("NOTIFY_SWEEP_INITIAL_DELAY_MS") {
            cfg.sweep.initial_delay_ms = parse_var("NOTIFY_SWEEP_INITIAL_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("NOTIFY_SWEEP_PERIOD_SECS") {
            cfg.sweep.period_secs = parse_var("NOTIFY_SWEEP_PERIOD_SECS", &v)?;
        }
        if let Some(v) = lookup("NOTIFY_MAX_CONCURRENT_FLUSHES") {
            cfg.sweep.max_concurrent_flushes = parse_var("NOTIFY_MAX_CONCURRENT_FLUSHES", &v)?;
        }
        if let Some(v) = lookup("NOTIFY_SKIP_IN_FLIGHT_USERS") {
            cfg.sweep.skip_in_flight_users = parse_var("NOTIFY_SKIP_IN_FLIGHT_USERS", &v)?;
        }
        if let Some(v) = lookup("NOTIFY_QUEUE_BACKEND") {
            cfg.queue = v.parse()?;
        }
        if let Some(v) = lookup("NOTIFY_PUSH_BACKEND") {
            cfg.push = v.parse()?;
        }
        if let Some(v) = lookup("NOTIFY_DATA_DIR") {
            if !v.trim().is_empty() {
                cfg.data_dir = Some(PathBuf::from(v.trim()));
            }
        }
        if let Some(v) = lookup("NOTIFY_MAX_QUEUE_DEPTH") {
            cfg.max_queue_depth = parse_var("NOTIFY_MAX_QUEUE_DEPTH", &v)?;
        }
        if let Some(v) = lookup("NOTIFY_AUDIT_CAPACITY") {
            cfg.audit_capacity = parse_var("NOTIFY_AUDIT_CAPACITY", &v)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{key}: invalid value `{value}`: {e}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ServiceConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sweep.period(), Duration::from_secs(600));
        assert_eq!(cfg.sweep.initial_delay(), Duration::from_millis(1));
        assert!(cfg.sweep.skip_in_flight_users);
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let cfg = ServiceConfig::from_json_str(r#"{"sweep":{"period_secs":30},"push":"session"}"#)
            .unwrap();
        assert_eq!(cfg.sweep.period_secs, 30);
        assert_eq!(cfg.sweep.initial_delay_ms, 1);
        assert_eq!(cfg.push, PushBackendConfig::Session);
        assert_eq!(cfg.queue, QueueBackendConfig::InMemory);
    }

    #[test]
    fn test_file_backend_requires_data_dir() {
        let err = ServiceConfig::from_json_str(r#"{"queue":"file"}"#).unwrap_err();
        assert!(err.contains("data_dir"));

        let ok = ServiceConfig::from_json_str(r#"{"queue":"file","data_dir":"/tmp/notify"}"#);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(ServiceConfig::from_json_str(r#"{"sweep":{"period_secs":0}}"#).is_err());
        assert!(ServiceConfig::from_json_str(r#"{"sweep":{"max_concurrent_flushes":0}}"#).is_err());
        assert!(ServiceConfig::from_json_str(r#"{"max_queue_depth":0}"#).is_err());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NOTIFY_SWEEP_PERIOD_SECS", "60"),
            ("NOTIFY_SKIP_IN_FLIGHT_USERS", "false"),
            ("NOTIFY_PUSH_BACKEND", "file"),
            ("NOTIFY_DATA_DIR", "/var/lib/notify"),
        ]
        .into_iter()
        .collect();

        let cfg = ServiceConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
        assert_eq!(cfg.sweep.period_secs, 60);
        assert!(!cfg.sweep.skip_in_flight_users);
        assert_eq!(cfg.push, PushBackendConfig::File);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/notify")));
    }

    #[test]
    fn test_lookup_bad_number() {
        let err = ServiceConfig::from_lookup(|k| {
            (k == "NOTIFY_MAX_QUEUE_DEPTH").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.contains("NOTIFY_MAX_QUEUE_DEPTH"));
    }
}
