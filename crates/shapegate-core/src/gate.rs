//! Serialized access to the external action.
//!
//! Every remote command -- webhook enable, delayed disable, watchdog
//! disable, manual apply -- goes through one `ActionGate`. The gate holds a
//! FIFO mutex for the whole duration of the command, so at most one action
//! runs at a time and waiting callers proceed in arrival order, no matter
//! how many HTTP connections or runtime threads are active.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use shapegate_types::action::ActionResult;
use shapegate_types::error::ActionError;

use crate::executor::RemoteExecutor;

/// FIFO gate around a `RemoteExecutor`.
pub struct ActionGate<E: RemoteExecutor> {
    executor: E,
    /// tokio's mutex queues waiters fairly, which gives the FIFO order.
    lock: Mutex<()>,
    timeout: Option<Duration>,
    next_ticket: AtomicU64,
    completed: AtomicU64,
}

impl<E: RemoteExecutor> ActionGate<E> {
    /// Create a gate. `timeout` of `None` lets an action run indefinitely.
    pub fn new(executor: E, timeout: Option<Duration>) -> Self {
        Self {
            executor,
            lock: Mutex::new(()),
            timeout,
            next_ticket: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    /// Run `command` once the gate is free.
    ///
    /// A non-zero exit status becomes `ActionError::CommandFailed` with the
    /// captured output attached. Nothing is retried.
    pub async fn run(&self, command: &str) -> Result<ActionResult, ActionError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(ticket, "waiting for action gate");

        let _guard = self.lock.lock().await;
        tracing::debug!(ticket, "action gate acquired");

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.executor.execute(command)).await {
                Ok(result) => result,
                Err(_) => Err(ActionError::Timeout(limit)),
            },
            None => self.executor.execute(command).await,
        };
        self.completed.fetch_add(1, Ordering::SeqCst);

        let result = outcome?;
        tracing::debug!(
            ticket,
            exit_status = ?result.exit_status,
            elapsed_ms = result.elapsed_ms,
            "action finished"
        );

        if result.succeeded() {
            Ok(result)
        } else {
            Err(ActionError::CommandFailed(result))
        }
    }

    /// Number of actions that have run to completion (successfully or not).
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Whether an action currently holds the gate.
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}
