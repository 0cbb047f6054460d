//! Polling completion waiter — drives an asynchronous run to a
//! terminal outcome within a fixed time budget.

use std::time::Duration;

use crate::enrich::transport::{GenerationTransport, RunHandle};

/// Fixed poll interval. The runs are short-lived, so no backoff.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Terminal outcome of a run. No further polling happens after any of
/// these is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    Failed(String),
    TimedOut,
}

/// Poll `handle` until it completes, fails, or the budget elapses.
///
/// `failed` and `cancelled` statuses are terminal on first sight —
/// there is no retry past them. A transport error while polling is
/// treated as a failure rather than retried; the budget is the only
/// cancellation mechanism.
pub async fn await_completion(
    transport: &dyn GenerationTransport,
    handle: &RunHandle,
    budget: Duration,
) -> CompletionOutcome {
    let started = tokio::time::Instant::now();

    loop {
        if started.elapsed() >= budget {
            tracing::warn!(run = %handle.run_id, "Run polling timed out");
            return CompletionOutcome::TimedOut;
        }

        match transport.get_run_status(handle).await {
            Ok(status) => match status.as_str() {
                "completed" => return CompletionOutcome::Completed,
                "failed" | "cancelled" => {
                    tracing::warn!(run = %handle.run_id, status = %status, "Run failed");
                    return CompletionOutcome::Failed(format!("run {status}"));
                }
                other => {
                    tracing::debug!(run = %handle.run_id, status = other, "Run still pending");
                }
            },
            Err(e) => return CompletionOutcome::Failed(e.to_string()),
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
