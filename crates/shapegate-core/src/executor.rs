//! Remote executor trait definition (port).

use shapegate_types::action::ActionResult;
use shapegate_types::error::ActionError;

/// Runs one command on the remote host and captures its output.
///
/// Implementations report transport failures as `ActionError` and return
/// the captured result otherwise, whatever the exit status; the action gate
/// decides what counts as failure.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait RemoteExecutor: Send + Sync {
    fn execute(
        &self,
        command: &str,
    ) -> impl std::future::Future<Output = Result<ActionResult, ActionError>> + Send;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Executor double that records every command it is asked to run.
    #[derive(Default)]
    pub struct RecordingExecutor {
        pub commands: Mutex<Vec<String>>,
        pub delay: Duration,
        pub exit_status: Option<u32>,
        active: AtomicUsize,
        pub max_active: AtomicUsize,
    }

    impl RecordingExecutor {
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                exit_status: Some(0),
                ..Self::default()
            }
        }

        pub fn failing(exit_status: u32) -> Self {
            Self {
                exit_status: Some(exit_status),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl RemoteExecutor for RecordingExecutor {
        async fn execute(&self, command: &str) -> Result<ActionResult, ActionError> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            self.commands.lock().unwrap().push(command.to_string());

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(ActionResult {
                exit_status: self.exit_status,
                stdout: format!("ran {} lines", command.lines().count()),
                stderr: if self.exit_status.unwrap_or(0) == 0 {
                    String::new()
                } else {
                    "Command fail. Return code -61".to_string()
                },
                elapsed_ms: self.delay.as_millis() as u64,
            })
        }
    }
}
