use super::*;
use serial_test::serial;

#[test]
#[serial]
fn file_overlay_defaults_to_empty_when_absent() {
    std::env::remove_var("OJ_CONFIG_PATH");
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("OJ_CONFIG_PATH", dir.path().join("missing.toml"));
    let overlay = FileOverlay::load().unwrap();
    assert!(overlay.retryable_error_types.is_empty());
    std::env::remove_var("OJ_CONFIG_PATH");
}

#[test]
#[serial]
fn file_overlay_parses_retryable_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "retryable_error_types = [\"TransientError\"]\njob_timeout_secs = 3600\n").unwrap();
    std::env::set_var("OJ_CONFIG_PATH", &path);

    let overlay = FileOverlay::load().unwrap();
    assert!(overlay.retryable_error_types.contains("TransientError"));
    assert_eq!(overlay.job_timeout_secs, Some(3600));
    std::env::remove_var("OJ_CONFIG_PATH");
}

#[test]
#[serial]
fn config_is_retryable_checks_overlay_set() {
    std::env::remove_var("OJ_CONFIG_PATH");
    let config = Config {
        volume_root: "/tmp".into(),
        log_dir: "/tmp/logs".into(),
        log_level: "info".into(),
        mode: "production".into(),
        visibility_timeout: std::time::Duration::from_secs(60),
        cancel_deadline: std::time::Duration::from_secs(10),
        retry_delay: std::time::Duration::from_secs(30),
        retryable_error_types: ["TransientError".to_string()].into_iter().collect(),
        job_timeout: None,
    };
    assert!(config.is_retryable("TransientError"));
    assert!(!config.is_retryable("FatalError"));
}
