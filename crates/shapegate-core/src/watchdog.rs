//! Inactivity fallback.
//!
//! If the media server goes quiet (crash, lost network, a stop event that
//! never arrived) shaping would stay enabled forever. The watchdog checks
//! the activity clock periodically and disables shaping once the idle
//! period passes the configured timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shapegate_types::action::ActionResult;
use shapegate_types::error::ActionError;

use crate::activity::ActivityClock;
use crate::executor::RemoteExecutor;
use crate::gate::ActionGate;

/// Periodic idle check that disables shaping after a quiet period.
pub struct InactivityWatchdog<E: RemoteExecutor + 'static> {
    gate: Arc<ActionGate<E>>,
    script: Arc<str>,
    clock: Arc<ActivityClock>,
    timeout: Duration,
    interval: Duration,
}

impl<E: RemoteExecutor + 'static> InactivityWatchdog<E> {
    pub fn new(
        gate: Arc<ActionGate<E>>,
        script: String,
        clock: Arc<ActivityClock>,
        timeout: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            gate,
            script: Arc::from(script),
            clock,
            timeout,
            interval,
        }
    }

    /// One idle check. Returns the action outcome if a disable was triggered.
    pub async fn check(&self) -> Option<Result<ActionResult, ActionError>> {
        let idle = self.clock.idle_for();
        tracing::info!(idle_secs = idle.as_secs(), "inactivity check");

        if idle < self.timeout {
            return None;
        }

        tracing::info!(
            idle_secs = idle.as_secs(),
            timeout_secs = self.timeout.as_secs(),
            "no events within inactivity timeout, disabling shaping"
        );
        let outcome = self.gate.run(&self.script).await;
        match &outcome {
            Ok(_) => tracing::info!("inactivity timeout: shaping policy disabled"),
            Err(e) => tracing::error!(error = %e, "inactivity timeout disable failed"),
        }
        // Reset either way so a failing disable is retried one timeout later,
        // not on every tick.
        self.clock.touch();
        Some(outcome)
    }

    /// Run the check every `interval` until `shutdown` fires.
    ///
    /// The first check happens one interval after the call.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut ticker = tokio::time::interval_at(start, self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(
                interval_secs = self.interval.as_secs(),
                timeout_secs = self.timeout.as_secs(),
                "inactivity watchdog started"
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("inactivity watchdog stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.check().await;
                    }
                }
            }
        })
    }
}
