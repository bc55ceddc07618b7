use super::*;
use chrono::Utc;
use oj_core::{CorrelationId, JobId, JobKind, JobStatus};

fn created(job_id: &JobId) -> Event {
    Event::JobCreated {
        job_id: job_id.clone(),
        kind: JobKind::Training,
        correlation_id: CorrelationId::generate_api(),
        config: serde_json::json!({}),
        created_at: Utc::now(),
    }
}

#[test]
fn job_created_is_idempotent() {
    let job_id = JobId::new(JobKind::Training);
    let event = created(&job_id);
    let mut state = MaterializedState::default();
    state.apply_event(&event);
    state.apply_event(&event);
    assert_eq!(state.jobs.len(), 1);
}

#[test]
fn replaying_terminal_events_does_not_resurrect_progress() {
    let job_id = JobId::new(JobKind::Training);
    let mut state = MaterializedState::default();
    state.apply_event(&created(&job_id));
    state.apply_event(&Event::JobCompleted {
        job_id: job_id.clone(),
        artifact_path: Some("out.safetensors".into()),
        ended_at: Utc::now(),
    });
    state.apply_event(&Event::JobProgressRecorded {
        job_id: job_id.clone(),
        progress_pct: 10.0,
        current_step: 1,
        total_steps: 100,
    });

    let job = state.jobs.get(job_id.as_str()).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress_pct, 100.0);
}

#[test]
fn queue_push_then_lease_then_ack() {
    let job_id = JobId::new(JobKind::Training);
    let mut state = MaterializedState::default();
    state.apply_event(&Event::QueuePushed {
        item_id: "item-1".into(),
        job_id: job_id.clone(),
        correlation_id: CorrelationId::generate_api(),
        enqueued_at: Utc::now(),
    });
    state.apply_event(&Event::QueueLeased {
        item_id: "item-1".into(),
        leased_at: Utc::now(),
    });
    assert_eq!(state.queue[0].status, QueueItemStatus::Leased);

    state.apply_event(&Event::QueueAcked {
        item_id: "item-1".into(),
    });
    assert_eq!(state.queue[0].status, QueueItemStatus::Done);
}

#[test]
fn job_retry_is_idempotent_across_replay() {
    let job_id = JobId::new(JobKind::Training);
    let mut state = MaterializedState::default();
    state.apply_event(&created(&job_id));
    state.apply_event(&Event::JobFailed {
        job_id: job_id.clone(),
        error_type: "TransientError".into(),
        error_message: "connection reset".into(),
        ended_at: Utc::now(),
    });
    let retried = Event::JobRetried {
        job_id: job_id.clone(),
        retry_count: 1,
    };
    state.apply_event(&retried);
    state.apply_event(&retried);

    let job = state.jobs.get(job_id.as_str()).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.retry_count, 1);
}
