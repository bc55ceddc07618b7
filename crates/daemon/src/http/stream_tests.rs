use super::super::test_support;
use super::*;
use oj_core::CorrelationId;

async fn body_text(response: impl IntoResponse) -> String {
    let body = response.into_response().into_body();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn terminal_job_streams_a_snapshot_then_closes() {
    let fixture = test_support::build();
    let now = chrono::Utc::now();
    let job = fixture
        .state
        .store
        .create_job(oj_core::JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), now)
        .unwrap();
    fixture.state.store.start_job(job.id, now).unwrap();
    fixture.state.store.complete_job(job.id, None, now).unwrap();

    let response = stream_job(State(fixture.state.clone()), Path(job.id.to_string())).await.unwrap();
    let text = body_text(response).await;
    assert!(text.contains("event: snapshot"));
    assert!(text.contains("\"status\":\"completed\""));
}

#[tokio::test]
async fn shutdown_emits_a_final_error_event_and_closes_the_stream() {
    let fixture = test_support::build();
    let now = chrono::Utc::now();
    let job = fixture
        .state
        .store
        .create_job(oj_core::JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), now)
        .unwrap();

    let response = stream_job(State(fixture.state.clone()), Path(job.id.to_string())).await.unwrap();
    fixture.shutdown_tx.send(true).unwrap();

    let text = body_text(response).await;
    assert!(text.contains("event: snapshot"));
    assert!(text.contains("event: error"));
    assert!(text.contains("server.shutdown"));
}

#[tokio::test]
async fn unknown_job_is_rejected() {
    let fixture = test_support::build();
    let result = stream_job(State(fixture.state.clone()), Path("train-000000000099".to_string())).await;
    assert!(matches!(result, Err(ApiError::JobNotFound(_))));
}
