//! Delayed disable for pause/stop events.
//!
//! A pause or stop does not disable shaping immediately: playback often
//! resumes within a minute or two. The disable is deferred by the configured
//! delay and cancelled if a start/resume arrives first. At most one disable
//! is pending at a time; scheduling another replaces it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use shapegate_types::event::PlaybackEvent;

use crate::executor::RemoteExecutor;
use crate::gate::ActionGate;

struct PendingDisable {
    id: u64,
    reason: PlaybackEvent,
    token: CancellationToken,
}

/// Owns the single pending delayed disable.
pub struct DisableScheduler<E: RemoteExecutor + 'static> {
    gate: Arc<ActionGate<E>>,
    script: Arc<str>,
    delay: Duration,
    pending: Arc<Mutex<Option<PendingDisable>>>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

impl<E: RemoteExecutor + 'static> DisableScheduler<E> {
    /// `script` is the disable command; timers stop when `shutdown` fires.
    pub fn new(
        gate: Arc<ActionGate<E>>,
        script: String,
        delay: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            gate,
            script: Arc::from(script),
            delay,
            pending: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
            shutdown,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the delay timer for `reason`, replacing any pending disable.
    ///
    /// Returns the id of the new pending disable.
    pub async fn schedule(&self, reason: &PlaybackEvent) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = self.shutdown.child_token();

        {
            let mut pending = self.pending.lock().await;
            let previous = pending.replace(PendingDisable {
                id,
                reason: reason.clone(),
                token: token.clone(),
            });
            if let Some(previous) = previous {
                previous.token.cancel();
                tracing::info!(
                    replaced = %previous.reason,
                    event = %reason,
                    "replacing pending delayed disable"
                );
            }
        }

        tracing::info!(
            event = %reason,
            delay_secs = self.delay.as_secs(),
            "starting delayed disable"
        );

        let gate = Arc::clone(&self.gate);
        let script = Arc::clone(&self.script);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;
        let reason = reason.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(event = %reason, "delayed disable cancelled");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            // A cancel that took the lock before us still wins.
            {
                let mut slot = pending.lock().await;
                if token.is_cancelled() {
                    tracing::info!(event = %reason, "delayed disable cancelled");
                    return;
                }
                if slot.as_ref().map(|p| p.id) == Some(id) {
                    *slot = None;
                }
            }

            tracing::info!(event = %reason, "executing disable after delay");
            match gate.run(&script).await {
                Ok(_) => {
                    tracing::info!(event = %reason, "delayed disable completed successfully");
                }
                Err(e) => {
                    tracing::error!(event = %reason, error = %e, "delayed disable failed");
                }
            }
        });

        id
    }

    /// Cancel the pending disable. Returns whether one was pending.
    pub async fn cancel_pending(&self) -> bool {
        let mut pending = self.pending.lock().await;
        match pending.take() {
            Some(previous) => {
                previous.token.cancel();
                tracing::info!(event = %previous.reason, "pending disable cancelled by playback");
                true
            }
            None => false,
        }
    }

    pub async fn has_pending(&self) -> bool {
        self.pending.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::RecordingExecutor;

    fn scheduler(delay: Duration) -> (DisableScheduler<RecordingExecutor>, Arc<ActionGate<RecordingExecutor>>, CancellationToken) {
        let gate = Arc::new(ActionGate::new(RecordingExecutor::with_delay(Duration::ZERO), None));
        let shutdown = CancellationToken::new();
        let scheduler = DisableScheduler::new(
            Arc::clone(&gate),
            "disable".to_string(),
            delay,
            shutdown.clone(),
        );
        (scheduler, gate, shutdown)
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_runs_after_delay() {
        let (scheduler, gate, _shutdown) = scheduler(Duration::from_secs(120));
        scheduler.schedule(&PlaybackEvent::Pause).await;
        assert!(scheduler.has_pending().await);

        tokio::time::sleep(Duration::from_secs(119)).await;
        assert!(gate.executor().calls().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(gate.executor().calls(), vec!["disable".to_string()]);
        assert!(!scheduler.has_pending().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_disable() {
        let (scheduler, gate, _shutdown) = scheduler(Duration::from_secs(120));
        scheduler.schedule(&PlaybackEvent::Stop).await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(scheduler.cancel_pending().await);
        assert!(!scheduler.has_pending().await);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(gate.executor().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_without_pending_returns_false() {
        let (scheduler, _gate, _shutdown) = scheduler(Duration::from_secs(120));
        assert!(!scheduler.cancel_pending().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_pending_disable() {
        let (scheduler, gate, _shutdown) = scheduler(Duration::from_secs(120));
        let first = scheduler.schedule(&PlaybackEvent::Pause).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        let second = scheduler.schedule(&PlaybackEvent::Stop).await;
        assert_ne!(first, second);

        // The first timer would have fired at 120s.
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(gate.executor().calls().is_empty());

        // The second fires at 180s.
        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(gate.executor().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_disable() {
        let (scheduler, gate, shutdown) = scheduler(Duration::from_secs(120));
        scheduler.schedule(&PlaybackEvent::Pause).await;
        shutdown.cancel();

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert!(gate.executor().calls().is_empty());
    }
}
