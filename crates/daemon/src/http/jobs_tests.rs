use super::super::test_support;
use super::*;

async fn body_json(response: impl IntoResponse) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_response().into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_training_merges_character_id_after_validation() {
    let fixture = test_support::build();
    let body = CreateTrainingRequest {
        character_id: "char-1".to_string(),
        config: serde_json::json!({"steps": 500}),
    };
    let response = create_training(State(fixture.state.clone()), Json(body)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["status"], "queued");

    let job = fixture.state.store.get_job(json["id"].as_str().unwrap()).unwrap();
    assert_eq!(job.config["character_id"], "char-1");
    assert_eq!(job.config["steps"], 500);
}

#[tokio::test]
async fn create_training_rejects_an_undeclared_parameter() {
    let fixture = test_support::build();
    let body = CreateTrainingRequest {
        character_id: "char-1".to_string(),
        config: serde_json::json!({"not_a_real_param": 1}),
    };
    let result = create_training(State(fixture.state.clone()), Json(body)).await;
    assert!(matches!(result, Err(ApiError::UnsupportedConfig { .. })));
}

#[tokio::test]
async fn list_training_returns_only_training_jobs_newest_first() {
    let fixture = test_support::build();
    create_training(
        State(fixture.state.clone()),
        Json(CreateTrainingRequest {
            character_id: "a".to_string(),
            config: serde_json::json!({}),
        }),
    )
    .await
    .unwrap();
    create_generation(State(fixture.state.clone()), Json(CreateGenerationRequest { config: serde_json::json!({}) }))
        .await
        .unwrap();

    let response = list_training(State(fixture.state.clone())).await;
    let jobs = body_json(response).await;
    assert_eq!(jobs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_queued_job_transitions_directly_in_the_store() {
    let fixture = test_support::build();
    let response = create_generation(State(fixture.state.clone()), Json(CreateGenerationRequest { config: serde_json::json!({}) }))
        .await
        .unwrap();
    let json = body_json(response).await;
    let id = json["id"].as_str().unwrap().to_string();

    let status = cancel_generation(State(fixture.state.clone()), Path(id.clone())).await.unwrap();
    assert_eq!(status.into_response().status(), StatusCode::NO_CONTENT);

    let job = fixture.state.store.get_job(&id).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn cancel_is_idempotent_on_an_already_terminal_job() {
    let fixture = test_support::build();
    let response = create_generation(State(fixture.state.clone()), Json(CreateGenerationRequest { config: serde_json::json!({}) }))
        .await
        .unwrap();
    let json = body_json(response).await;
    let id = json["id"].as_str().unwrap().to_string();
    cancel_generation(State(fixture.state.clone()), Path(id.clone())).await.unwrap();

    // Cancelling an already-cancelled job is a no-op, not an error.
    let result = cancel_generation(State(fixture.state.clone()), Path(id)).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn get_job_rejects_a_path_unsafe_id() {
    let fixture = test_support::build();
    let result = get_training(State(fixture.state.clone()), Path("../etc/passwd".to_string())).await;
    assert!(matches!(result, Err(ApiError::InvalidJobId)));
}
