use crate::config::{Config, ExportMode, PushScope, lookup_from};
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

#[test]
fn test_config_defaults_match_legacy_exporter() {
    let config = Config::from_lookup(&lookup_from(&[])).unwrap();

    assert_eq!(
        config.to_push_target().endpoint().unwrap().as_str(),
        "http://localhost:9091/metrics/job/top/instance/machine"
    );
    assert_eq!(config.export_mode, ExportMode::Periodic);
    assert_eq!(config.export_interval, Duration::from_secs(15));
    assert_eq!(config.to_retry_policy().max_retries(), 0);
}

#[test]
fn test_config_composes_sub_configs() {
    let config = Config::from_lookup(&lookup_from(&[
        ("PUSHGATEWAY_URL", "https://gw.example.net:9443/push"),
        ("PUSHGATEWAY_JOB", "systemd"),
        ("PUSHGATEWAY_INSTANCE", "web-01"),
        ("EXPORT_MODE", "per-event"),
        ("PUSH_SCOPE", "unit"),
        ("PUSH_MAX_RETRIES", "2"),
    ]))
    .unwrap();

    assert_eq!(
        config.to_push_target().endpoint().unwrap().as_str(),
        "https://gw.example.net:9443/push/metrics/job/systemd/instance/web-01"
    );

    let policy = config.to_export_policy();
    assert_eq!(policy.mode, ExportMode::PerEvent);
    assert_eq!(policy.scope, PushScope::Unit);
    assert_eq!(config.to_retry_policy().max_retries(), 2);
}

#[test]
fn test_config_error_names_failing_section() {
    let err = Config::from_lookup(&lookup_from(&[("EXPORT_MODE", "hourly")])).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("export config"));
    assert!(msg.contains("hourly"));
}

#[test]
fn test_config_from_env() {
    let _guard = get_env_lock().lock().unwrap();
    // SAFETY: environment mutation is serialized by ENV_LOCK
    unsafe {
        env::set_var("PUSHGATEWAY_JOB", "from-env");
        env::set_var("EXPORT_INTERVAL_SECS", "30");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.job, "from-env");
    assert_eq!(config.export_interval, Duration::from_secs(30));

    // Cleanup
    unsafe {
        env::remove_var("PUSHGATEWAY_JOB");
        env::remove_var("EXPORT_INTERVAL_SECS");
    }
}
