use super::super::test_support;
use super::*;

#[tokio::test]
async fn debug_bundle_is_a_zip_attachment() {
    let fixture = test_support::build();
    let now = chrono::Utc::now();
    let job = fixture
        .state
        .store
        .create_job(oj_core::JobKind::Training, oj_core::CorrelationId::generate_api(), serde_json::json!({}), now)
        .unwrap();

    let response = debug_bundle(State(fixture.state.clone()), Path(job.id.to_string())).await.unwrap().into_response();
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "application/zip");
    let disposition = response.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
    assert!(disposition.contains(&job.id.to_string()));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!body.is_empty());
    assert_eq!(&body[..2], b"PK");
}

#[tokio::test]
async fn unknown_job_returns_not_found() {
    let fixture = test_support::build();
    let result = debug_bundle(State(fixture.state.clone()), Path("train-000000000099".to_string())).await;
    assert!(matches!(result, Err(ApiError::JobNotFound(_))));
}
