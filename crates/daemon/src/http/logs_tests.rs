use super::super::test_support;
use super::*;
use oj_core::{CorrelationId, JobId, Stage};

fn entry(job_id: JobId, level: LogLevel, event: &str) -> JobLogEntry {
    JobLogEntry {
        ts: chrono::Utc::now(),
        level,
        service: "worker".to_string(),
        job_id,
        event: event.to_string(),
        msg: format!("{event} happened"),
        correlation_id: None,
        fields: None,
        status: None,
        stage: Some(Stage::Training),
        step: None,
        steps_total: None,
        progress_pct: None,
        loss: None,
        lr: None,
        eta_seconds: None,
        sample_path: None,
        error: None,
        error_type: None,
        error_stack: None,
    }
}

fn seed_job_with_events(fixture: &test_support::Fixture, build_entries: impl Fn(JobId) -> Vec<JobLogEntry>) -> String {
    let job = fixture
        .state
        .store
        .create_job(oj_core::JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    let path = log_file::events_path(&fixture.state.config.volume_root, job.id.as_str());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body: String = build_entries(job.id)
        .iter()
        .map(|e| format!("{}\n", serde_json::to_string(e).unwrap()))
        .collect();
    std::fs::write(&path, body).unwrap();
    job.id.to_string()
}

#[tokio::test]
async fn view_logs_filters_by_level_and_event() {
    let fixture = test_support::build();
    let id = seed_job_with_events(&fixture, |job_id| {
        vec![
            entry(job_id, LogLevel::Info, "training.step"),
            entry(job_id, LogLevel::Error, "training.step"),
            entry(job_id, LogLevel::Info, "training.start"),
        ]
    });

    let response = view_logs(
        State(fixture.state.clone()),
        Path(id.clone()),
        Query(ViewQuery {
            level: Some("ERROR".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap()
    .into_response();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let view: ViewResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.total, 1);
}

#[tokio::test]
async fn view_logs_limit_zero_returns_no_entries_but_correct_total() {
    let fixture = test_support::build();
    let id = seed_job_with_events(&fixture, |job_id| {
        vec![entry(job_id, LogLevel::Info, "a"), entry(job_id, LogLevel::Info, "b")]
    });

    let response = view_logs(
        State(fixture.state.clone()),
        Path(id),
        Query(ViewQuery {
            limit: Some(0),
            ..Default::default()
        }),
    )
    .await
    .unwrap()
    .into_response();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let view: ViewResponse = serde_json::from_slice(&body).unwrap();
    assert!(view.entries.is_empty());
    assert_eq!(view.total, 2);
}

#[tokio::test]
async fn download_logs_streams_the_raw_file() {
    let fixture = test_support::build();
    let id = seed_job_with_events(&fixture, |job_id| vec![entry(job_id, LogLevel::Info, "a")]);

    let response = download_logs(State(fixture.state.clone()), Path(id.clone())).await.unwrap().into_response();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/x-ndjson"
    );
    let disposition = response.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
    assert!(disposition.contains(&id));
}

#[tokio::test]
async fn unknown_job_is_rejected() {
    let fixture = test_support::build();
    let result = view_logs(
        State(fixture.state.clone()),
        Path("train-000000000099".to_string()),
        Query(ViewQuery::default()),
    )
    .await;
    assert!(matches!(result, Err(ApiError::JobNotFound(_))));
}
