use super::test_support;
use super::*;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

#[tokio::test]
async fn health_is_reachable_under_api_prefix() {
    let fixture = test_support::build();
    let router = build_router((*fixture.state).clone());

    let response = router
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

#[tokio::test]
async fn response_echoes_a_valid_request_correlation_id() {
    let fixture = test_support::build();
    let router = build_router((*fixture.state).clone());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(CORRELATION_HEADER, "api-0123456789ab")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(CORRELATION_HEADER).unwrap().to_str().unwrap(),
        "api-0123456789ab"
    );
}

#[tokio::test]
async fn response_gets_a_generated_correlation_id_when_none_is_sent() {
    let fixture = test_support::build();
    let router = build_router((*fixture.state).clone());

    let response = router
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let header = response.headers().get(CORRELATION_HEADER).unwrap().to_str().unwrap();
    assert!(header.starts_with("api-"));
}

#[tokio::test]
async fn response_gets_a_generated_correlation_id_when_the_sent_one_is_malformed() {
    let fixture = test_support::build();
    let router = build_router((*fixture.state).clone());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(CORRELATION_HEADER, "not a valid id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let header = response.headers().get(CORRELATION_HEADER).unwrap().to_str().unwrap();
    assert_ne!(header, "not a valid id");
    assert!(header.starts_with("api-"));
}
