use super::*;
use crate::id::JobKind;

fn sample_entry() -> JobLogEntry {
    JobLogEntry {
        ts: Utc::now(),
        level: LogLevel::Info,
        service: "worker".into(),
        job_id: JobId::new(JobKind::Training),
        event: "training.step".into(),
        msg: "step 3/5".into(),
        correlation_id: Some(CorrelationId::generate_api()),
        fields: None,
        status: Some(JobStatus::Running),
        stage: Some(Stage::Training),
        step: Some(3),
        steps_total: Some(5),
        progress_pct: Some(60.0),
        loss: Some(0.42),
        lr: Some(0.0001),
        eta_seconds: Some(12.0),
        sample_path: None,
        error: None,
        error_type: None,
        error_stack: None,
    }
}

#[test]
fn progress_event_projection_carries_fields() {
    let entry = sample_entry();
    let event = entry.to_progress_event().expect("has status+stage");
    assert_eq!(event.job_id.as_str(), entry.job_id.as_str());
    assert_eq!(event.progress_pct, 60.0);
    assert_eq!(event.stage, Stage::Training);
}

#[test]
fn entries_without_status_are_not_progress_events() {
    let mut entry = sample_entry();
    entry.status = None;
    assert!(entry.to_progress_event().is_none());
}

#[test]
fn job_log_entry_round_trips_json() {
    let entry = sample_entry();
    let json = serde_json::to_string(&entry).expect("serialize");
    let back: JobLogEntry = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.event, entry.event);
    assert_eq!(back.msg, entry.msg);
}

#[test]
fn log_level_parses_case_insensitively() {
    use std::str::FromStr;
    assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
    assert_eq!(LogLevel::from_str("ERROR").unwrap(), LogLevel::Error);
    assert_eq!(LogLevel::from_str("warn").unwrap(), LogLevel::Warning);
    assert!(LogLevel::from_str("nonsense").is_err());
}
