//! Webhook event handling.
//!
//! `ShapingService` ties the pieces together: it records activity, applies
//! the decision table, runs the enable synchronously through the gate and
//! hands disables to the scheduler. It also owns the inactivity watchdog.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shapegate_types::action::{ActionResult, ShapingState};
use shapegate_types::config::{ShapingConfig, TimingConfig};
use shapegate_types::error::ActionError;
use shapegate_types::event::WebhookPayload;

use crate::activity::ActivityClock;
use crate::command::ShapingPolicies;
use crate::decision::{Decision, decide};
use crate::executor::RemoteExecutor;
use crate::gate::ActionGate;
use crate::scheduler::DisableScheduler;
use crate::watchdog::InactivityWatchdog;

/// What the service did with one webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Shaping was enabled; carries the captured command output.
    Enabled(ActionResult),
    /// A delayed disable was started.
    DisableScheduled { delay: Duration },
    /// Remote streams are active; nothing changed.
    Skipped { wan_streams: i64 },
    /// The event is not one we act on.
    Ignored,
}

/// Point-in-time view for the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub pending_disable: bool,
    pub action_in_progress: bool,
    pub actions_completed: u64,
    pub idle_secs: u64,
}

/// Orchestrates the shaping actions for incoming playback events.
pub struct ShapingService<E: RemoteExecutor + 'static> {
    gate: Arc<ActionGate<E>>,
    policies: ShapingPolicies,
    scheduler: DisableScheduler<E>,
    clock: Arc<ActivityClock>,
    timing: TimingConfig,
    shutdown: CancellationToken,
}

impl<E: RemoteExecutor + 'static> ShapingService<E> {
    pub fn new(executor: E, shaping: &ShapingConfig, timing: &TimingConfig) -> Self {
        let gate = Arc::new(ActionGate::new(executor, timing.action_timeout()));
        let policies = ShapingPolicies::new(shaping.policy_ids.clone());
        let shutdown = CancellationToken::new();
        let scheduler = DisableScheduler::new(
            Arc::clone(&gate),
            policies.script(ShapingState::Disable),
            timing.disable_delay(),
            shutdown.clone(),
        );

        Self {
            gate,
            policies,
            scheduler,
            clock: Arc::new(ActivityClock::new()),
            timing: timing.clone(),
            shutdown,
        }
    }

    /// Handle one validated webhook.
    ///
    /// Only the enable path runs an action inline; its failure is returned
    /// as-is and not retried.
    pub async fn handle(&self, payload: &WebhookPayload) -> Result<EventOutcome, ActionError> {
        self.clock.touch();
        let event = &payload.event;

        match decide(event, payload.wan_streams) {
            Decision::Enable => {
                tracing::info!(event = %event, "processing enable event");
                self.scheduler.cancel_pending().await;
                let result = self.apply(ShapingState::Enable).await?;
                Ok(EventOutcome::Enabled(result))
            }
            Decision::ScheduleDisable => {
                tracing::info!(
                    event = %event,
                    wan_streams = payload.wan_streams,
                    "triggering delayed disable"
                );
                self.scheduler.schedule(event).await;
                Ok(EventOutcome::DisableScheduled {
                    delay: self.scheduler.delay(),
                })
            }
            Decision::SkipActiveStreams => {
                tracing::info!(
                    event = %event,
                    wan_streams = payload.wan_streams,
                    "skipping disable, wan streams active"
                );
                Ok(EventOutcome::Skipped {
                    wan_streams: payload.wan_streams,
                })
            }
            Decision::Ignore => {
                tracing::info!(event = %event, "ignoring unhandled event");
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Set every configured policy to `state` now, through the gate.
    pub async fn apply(&self, state: ShapingState) -> Result<ActionResult, ActionError> {
        self.gate.run(&self.policies.script(state)).await
    }

    /// Start the inactivity watchdog; it stops on `shutdown()`.
    pub fn start_watchdog(&self) -> JoinHandle<()> {
        InactivityWatchdog::new(
            Arc::clone(&self.gate),
            self.policies.script(ShapingState::Disable),
            Arc::clone(&self.clock),
            self.timing.inactivity_timeout(),
            self.timing.inactivity_check_interval(),
        )
        .spawn(self.shutdown.clone())
    }

    pub async fn status(&self) -> ServiceStatus {
        ServiceStatus {
            pending_disable: self.scheduler.has_pending().await,
            action_in_progress: self.gate.is_busy(),
            actions_completed: self.gate.completed(),
            idle_secs: self.clock.idle_for().as_secs(),
        }
    }

    pub fn policies(&self) -> &ShapingPolicies {
        &self.policies
    }

    pub fn gate(&self) -> &ActionGate<E> {
        &self.gate
    }

    /// Cancel the pending disable timer and stop the watchdog.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
