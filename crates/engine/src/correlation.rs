// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation-id context propagation (spec §4.2): a task-local value
//! carried through every async call path so every log line and event a
//! request causes can be tied back to the action that triggered it.

use oj_core::CorrelationId;
use std::future::Future;

tokio::task_local! {
    static CORRELATION_ID: CorrelationId;
}

/// Runs `fut` with `correlation_id` set as the task-local context, the
/// same pattern the worker loop uses to restore context after dequeuing a
/// job (spec §4.2: "restored on worker dequeue").
pub async fn scope<F: Future>(correlation_id: CorrelationId, fut: F) -> F::Output {
    CORRELATION_ID.scope(correlation_id, fut).await
}

/// The current task's correlation id, if one has been set via [`scope`].
/// `None` only before any request or job has entered scope (spec §4.1:
/// "absent only before any request arrives").
pub fn current() -> Option<CorrelationId> {
    CORRELATION_ID.try_with(|id| *id).ok()
}

#[cfg(test)]
#[path = "correlation_tests.rs"]
mod tests;
