//! CLI command definitions for the `shapegate` binary.

pub mod apply;
pub mod check_config;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use shapegate_types::action::ShapingState;

/// Toggle FortiGate traffic shaping from media server webhooks.
#[derive(Parser)]
#[command(name = "shapegate", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(
        long,
        global = true,
        env = "SHAPEGATE_CONFIG",
        default_value = shapegate_infra::config::DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the webhook receiver.
    Serve {
        /// Address to bind (overrides server.host).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port).
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Load and validate the configuration, then print it with secrets redacted.
    #[command(name = "check-config")]
    CheckConfig,

    /// Enable or disable the shaping policies once, right now.
    Apply {
        #[arg(value_enum)]
        state: ApplyState,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ApplyState {
    Enable,
    Disable,
}

impl From<ApplyState> for ShapingState {
    fn from(state: ApplyState) -> Self {
        match state {
            ApplyState::Enable => ShapingState::Enable,
            ApplyState::Disable => ShapingState::Disable,
        }
    }
}

impl Cli {
    /// Default log filter for the verbosity flags; `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => match self.command {
                Commands::Serve { .. } => "info",
                _ => "warn",
            },
            1 => "info,shapegate=debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from(["shapegate", "serve", "--port", "8080", "-v"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { port: Some(8080), host: None }
        ));
        assert_eq!(cli.log_filter(), "info,shapegate=debug");
    }

    #[test]
    fn test_parse_apply_state() {
        let cli = Cli::try_parse_from(["shapegate", "--quiet", "apply", "disable"]).unwrap();
        match cli.command {
            Commands::Apply { state } => {
                assert_eq!(ShapingState::from(state), ShapingState::Disable)
            }
            _ => panic!("expected apply"),
        }
        assert_eq!(cli.log_filter(), "error");
    }

    #[test]
    fn test_apply_rejects_unknown_state() {
        assert!(Cli::try_parse_from(["shapegate", "apply", "toggle"]).is_err());
    }
}
