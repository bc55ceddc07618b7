use super::*;

#[test]
fn job_id_has_expected_shape() {
    let id = JobId::new(JobKind::Training);
    assert!(id.as_str().starts_with("train-"));
    assert_eq!(id.as_str().len(), "train-".len() + 12);
    assert_eq!(id.kind(), Some(JobKind::Training));
}

#[test]
fn job_id_generation_prefix() {
    let id = JobId::new(JobKind::Generation);
    assert!(id.as_str().starts_with("gen-"));
    assert_eq!(id.kind(), Some(JobKind::Generation));
}

#[test]
fn job_ids_are_unique() {
    let a = JobId::new(JobKind::Training);
    let b = JobId::new(JobKind::Training);
    assert_ne!(a.as_str(), b.as_str());
}

#[test]
fn job_id_round_trips_through_serde() {
    let id = JobId::new(JobKind::Training);
    let json = serde_json::to_string(&id).expect("serialize");
    let back: JobId = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(id.as_str(), back.as_str());
}

#[test]
fn path_safe_job_id_rejects_traversal() {
    assert!(is_path_safe_job_id("train-aaaa00000001"));
    assert!(!is_path_safe_job_id("../etc/passwd"));
    assert!(!is_path_safe_job_id("train/../../x"));
    assert!(!is_path_safe_job_id(""));
}

#[test]
fn correlation_id_accepts_valid_header() {
    let id = CorrelationId::from_header_value("fe-abc123").expect("valid");
    assert_eq!(id.as_str(), "fe-abc123");
}

#[test]
fn correlation_id_rejects_invalid_header() {
    assert!(CorrelationId::from_header_value("").is_none());
    assert!(CorrelationId::from_header_value("has space").is_none());
    assert!(CorrelationId::from_header_value(&"x".repeat(65)).is_none());
}

#[test]
fn correlation_id_generate_uses_prefix() {
    let id = CorrelationId::generate(CORRELATION_PREFIX_FRONTEND);
    assert!(id.as_str().starts_with("fe-"));
}
