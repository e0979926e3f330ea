//! `shapegate apply <enable|disable>`: run the shaping script once.

use shapegate_core::executor::RemoteExecutor;
use shapegate_core::service::ShapingService;
use shapegate_types::action::{ActionResult, ShapingState};
use shapegate_types::error::ActionError;

/// Run the action through the service's gate and report the outcome.
///
/// Returns an error on failure so the process exits non-zero.
pub async fn apply_state<E: RemoteExecutor + 'static>(
    service: &ShapingService<E>,
    state: ShapingState,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = service.apply(state).await;

    if json {
        let report = match &outcome {
            Ok(result) => serde_json::json!({
                "state": state,
                "success": true,
                "result": result,
            }),
            Err(e) => serde_json::json!({
                "state": state,
                "success": false,
                "error": e.to_string(),
                "result": e.result(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_outcome(state, &outcome);
    }

    outcome
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("shaping {state} failed: {e}"))
}

fn print_outcome(state: ShapingState, outcome: &Result<ActionResult, ActionError>) {
    println!();
    match outcome {
        Ok(result) => {
            println!(
                "  {} Shaping policies set to {} ({} ms)",
                console::style("✓").green().bold(),
                console::style(state).cyan(),
                result.elapsed_ms
            );
            print_output(result);
        }
        Err(e) => {
            println!(
                "  {} Failed to set shaping policies to {}: {e}",
                console::style("✗").red().bold(),
                console::style(state).cyan(),
            );
            if let Some(result) = e.result() {
                print_output(result);
            }
        }
    }
    println!();
}

fn print_output(result: &ActionResult) {
    if !result.stdout.trim().is_empty() {
        println!();
        for line in result.stdout.lines() {
            println!("    {}", console::style(line).dim());
        }
    }
    if !result.stderr.trim().is_empty() {
        println!();
        for line in result.stderr.lines() {
            println!("    {}", console::style(line).red());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use shapegate_types::config::{ShapingConfig, TimingConfig};

    use super::*;

    struct ScriptedExecutor {
        exit_status: Option<u32>,
        commands: Mutex<Vec<String>>,
    }

    impl RemoteExecutor for ScriptedExecutor {
        async fn execute(&self, command: &str) -> Result<ActionResult, ActionError> {
            self.commands.lock().unwrap().push(command.to_string());
            Ok(ActionResult {
                exit_status: self.exit_status,
                stdout: String::new(),
                stderr: String::new(),
                elapsed_ms: 1,
            })
        }
    }

    fn service(exit_status: Option<u32>) -> ShapingService<ScriptedExecutor> {
        ShapingService::new(
            ScriptedExecutor {
                exit_status,
                commands: Mutex::new(Vec::new()),
            },
            &ShapingConfig::default(),
            &TimingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_apply_disable_runs_disable_script() {
        let svc = service(Some(0));
        apply_state(&svc, ShapingState::Disable, true).await.unwrap();

        let commands = svc.gate().executor().commands.lock().unwrap().clone();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].contains("set status disable"));
        assert!(!commands[0].contains("set status enable"));
    }

    #[tokio::test]
    async fn test_apply_missing_exit_status_counts_as_success() {
        let svc = service(None);
        assert!(apply_state(&svc, ShapingState::Enable, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_apply_failure_is_an_error() {
        let svc = service(Some(1));
        let err = apply_state(&svc, ShapingState::Enable, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("shaping enable failed"));
    }
}
