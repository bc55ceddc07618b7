use super::*;
use oj_core::{JobKind, PluginCapabilities, RunResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

struct ScriptedPlugin {
    backend: &'static str,
    calls: Arc<AtomicUsize>,
    behavior: PluginBehavior,
}

enum PluginBehavior {
    Succeed,
    Fail { error_type: &'static str },
    WaitForCancel,
    NeverReturns,
}

#[async_trait::async_trait]
impl Plugin for ScriptedPlugin {
    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            backend: self.backend.to_string(),
            parameters: Default::default(),
            wired: true,
            reason: None,
        }
    }

    async fn run(&self, _config: serde_json::Value, logger: Arc<dyn ProgressSink>, cancel_token: CancelToken) -> RunResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            PluginBehavior::Succeed => {
                logger
                    .log(oj_core::JobLogEntry {
                        ts: chrono::Utc::now(),
                        level: oj_core::LogLevel::Info,
                        service: "worker".into(),
                        job_id: JobId::from_string("train-000000000001"),
                        event: "training.step".into(),
                        msg: "step".into(),
                        correlation_id: None,
                        fields: None,
                        status: Some(JobStatus::Running),
                        stage: Some(Stage::Training),
                        step: Some(1),
                        steps_total: Some(1),
                        progress_pct: Some(100.0),
                        loss: None,
                        lr: None,
                        eta_seconds: None,
                        sample_path: None,
                        error: None,
                        error_type: None,
                        error_stack: None,
                    })
                    .await;
                RunResult {
                    success: true,
                    artifact_path: Some("artifact.safetensors".to_string()),
                    samples: vec![],
                    error: None,
                    error_type: None,
                }
            }
            PluginBehavior::Fail { error_type } => RunResult {
                success: false,
                artifact_path: None,
                samples: vec![],
                error: Some("simulated failure".to_string()),
                error_type: Some(error_type.to_string()),
            },
            PluginBehavior::WaitForCancel => {
                while !cancel_token.is_set() {
                    tokio::time::sleep(StdDuration::from_millis(10)).await;
                }
                RunResult {
                    success: false,
                    artifact_path: None,
                    samples: vec![],
                    error: Some("cancelled".to_string()),
                    error_type: Some("Cancelled".to_string()),
                }
            }
            PluginBehavior::NeverReturns => {
                loop {
                    tokio::time::sleep(StdDuration::from_secs(3600)).await;
                }
            }
        }
    }
}

fn test_config(volume_root: &std::path::Path, cancel_deadline_ms: u64) -> Config {
    Config {
        volume_root: volume_root.to_path_buf(),
        log_dir: volume_root.join("logs"),
        log_level: "info".to_string(),
        mode: "development".to_string(),
        visibility_timeout: StdDuration::from_secs(60),
        cancel_deadline: StdDuration::from_millis(cancel_deadline_ms),
        retry_delay: StdDuration::from_millis(50),
        retryable_error_types: ["TransientError".to_string()].into_iter().collect(),
        job_timeout: None,
    }
}

fn build_executor(
    dir: &std::path::Path,
    behavior: PluginBehavior,
    cancel_deadline_ms: u64,
) -> (Arc<Executor>, Arc<oj_storage::JobStore>, Arc<AtomicUsize>) {
    let store = Arc::new(oj_storage::JobStore::open(dir.join("wal.jsonl")).unwrap());
    let bus = Arc::new(EventBus::new());
    let config = test_config(dir, cancel_deadline_ms);
    let calls = Arc::new(AtomicUsize::new(0));
    let plugin: Arc<dyn Plugin> = Arc::new(ScriptedPlugin {
        backend: "lora-trainer",
        calls: calls.clone(),
        behavior,
    });
    let mut plugins: HashMap<JobKind, Arc<dyn Plugin>> = HashMap::new();
    plugins.insert(JobKind::Training, plugin);
    let executor = Arc::new(Executor::new(store.clone(), bus, config, plugins));
    (executor, store, calls)
}

#[tokio::test]
async fn run_once_executes_a_pending_job_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let (executor, store, calls) = build_executor(dir.path(), PluginBehavior::Succeed, 1000);

    let job = store
        .create_job(JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    store.enqueue(job.id, job.correlation_id, chrono::Utc::now()).unwrap();

    let did_work = executor.run_once().await.unwrap();
    assert!(did_work);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stored = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.artifact_path.as_deref(), Some("artifact.safetensors"));
}

#[tokio::test]
async fn run_once_is_false_when_queue_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (executor, _store, _calls) = build_executor(dir.path(), PluginBehavior::Succeed, 1000);
    assert!(!executor.run_once().await.unwrap());
}

#[tokio::test]
async fn failed_plugin_marks_job_failed_without_retryable_type() {
    let dir = tempfile::tempdir().unwrap();
    let (executor, store, _calls) = build_executor(
        dir.path(),
        PluginBehavior::Fail {
            error_type: "FatalError",
        },
        1000,
    );

    let job = store
        .create_job(JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    store.enqueue(job.id, job.correlation_id, chrono::Utc::now()).unwrap();
    executor.run_once().await.unwrap();

    let stored = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.error_type.as_deref(), Some("FatalError"));
}

#[tokio::test]
async fn retryable_failure_is_requeued_after_delay() {
    let dir = tempfile::tempdir().unwrap();
    let (executor, store, _calls) = build_executor(
        dir.path(),
        PluginBehavior::Fail {
            error_type: "TransientError",
        },
        1000,
    );

    let job = store
        .create_job(JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    store.enqueue(job.id, job.correlation_id, chrono::Utc::now()).unwrap();
    executor.run_once().await.unwrap();

    let stored = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.status, JobStatus::Failed);

    tokio::time::sleep(StdDuration::from_millis(200)).await;

    let retried = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(retried.status, JobStatus::Queued);
    assert_eq!(retried.retry_count, 1);
}

#[tokio::test]
async fn cooperative_cancel_is_observed_before_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let (executor, store, _calls) = build_executor(dir.path(), PluginBehavior::WaitForCancel, 2000);

    let job = store
        .create_job(JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    store.enqueue(job.id, job.correlation_id, chrono::Utc::now()).unwrap();

    let exec_clone = executor.clone();
    let run_task = tokio::spawn(async move { exec_clone.run_once().await });

    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert!(executor.signal_cancel(job.id.as_str()));

    run_task.await.unwrap().unwrap();

    let stored = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn forced_cancel_deadline_aborts_a_stuck_plugin() {
    let dir = tempfile::tempdir().unwrap();
    let (executor, store, _calls) = build_executor(dir.path(), PluginBehavior::NeverReturns, 100);

    let job = store
        .create_job(JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    store.enqueue(job.id, job.correlation_id, chrono::Utc::now()).unwrap();

    let exec_clone = executor.clone();
    let run_task = tokio::spawn(async move { exec_clone.run_once().await });

    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert!(executor.signal_cancel(job.id.as_str()));

    run_task.await.unwrap().unwrap();

    let stored = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn already_cancelled_job_is_skipped_on_dequeue() {
    let dir = tempfile::tempdir().unwrap();
    let (executor, store, calls) = build_executor(dir.path(), PluginBehavior::Succeed, 1000);

    let job = store
        .create_job(JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    store.enqueue(job.id, job.correlation_id, chrono::Utc::now()).unwrap();
    store.cancel_job(job.id, chrono::Utc::now()).unwrap();

    let did_work = executor.run_once().await.unwrap();
    assert!(did_work);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "plugin must not be invoked for a pre-cancelled job");

    let stored = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn missing_plugin_fails_the_job_with_plugin_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(oj_storage::JobStore::open(dir.path().join("wal.jsonl")).unwrap());
    let bus = Arc::new(EventBus::new());
    let config = test_config(dir.path(), 1000);
    let executor = Arc::new(Executor::new(store.clone(), bus, config, HashMap::new()));

    let job = store
        .create_job(JobKind::Generation, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    store.enqueue(job.id, job.correlation_id, chrono::Utc::now()).unwrap();

    executor.run_once().await.unwrap();

    let stored = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.error_type.as_deref(), Some("PluginUnavailable"));
}

#[tokio::test]
async fn expired_lease_is_redelivered_to_a_fresh_run_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(oj_storage::JobStore::open(dir.path().join("wal.jsonl")).unwrap());
    let bus = Arc::new(EventBus::new());
    let mut config = test_config(dir.path(), 1000);
    config.visibility_timeout = StdDuration::from_millis(1);
    let calls = Arc::new(AtomicUsize::new(0));
    let plugin: Arc<dyn Plugin> = Arc::new(ScriptedPlugin {
        backend: "lora-trainer",
        calls: calls.clone(),
        behavior: PluginBehavior::Succeed,
    });
    let mut plugins: HashMap<JobKind, Arc<dyn Plugin>> = HashMap::new();
    plugins.insert(JobKind::Training, plugin);
    let executor = Arc::new(Executor::new(store.clone(), bus, config, plugins));

    let job = store
        .create_job(JobKind::Training, CorrelationId::generate_api(), serde_json::json!({}), chrono::Utc::now())
        .unwrap();
    store.enqueue(job.id, job.correlation_id, chrono::Utc::now()).unwrap();

    // Lease it directly (simulating a worker that crashed before acking).
    store.lease_next(chrono::Utc::now()).unwrap();
    tokio::time::sleep(StdDuration::from_millis(20)).await;

    executor.run_once().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let stored = store.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
}
