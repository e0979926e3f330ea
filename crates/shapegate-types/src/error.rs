use std::time::Duration;

use thiserror::Error;

use crate::action::ActionResult;

/// Errors raised while validating a webhook body.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("missing 'event' field")]
    MissingEvent,

    #[error("'event' must be a non-empty string, got {0}")]
    InvalidEvent(String),
}

/// Errors raised by the external (SSH) action.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("connection to {target} failed: {reason}")]
    Connect { target: String, reason: String },

    #[error("authentication as '{user}' rejected by {target}")]
    Authentication { user: String, target: String },

    #[error("remote channel error: {0}")]
    Channel(String),

    #[error("remote command exited with status {}", .0.exit_status_label())]
    CommandFailed(ActionResult),

    #[error("action did not complete within {0:?}")]
    Timeout(Duration),
}

impl ActionError {
    /// The captured command output, when the command got as far as running.
    pub fn result(&self) -> Option<&ActionResult> {
        match self {
            ActionError::CommandFailed(result) => Some(result),
            _ => None,
        }
    }
}

/// Errors raised while authenticating a webhook request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authentication: {0}")]
    MissingToken(String),

    #[error("webhook token verification failed")]
    InvalidToken,
}

/// Errors raised while loading or validating the service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid value for {key}: '{value}'")]
    InvalidOverride { key: String, value: String },

    #[error("WEBHOOK_TOKEN (auth.token) is required")]
    MissingToken,

    #[error("no SSH credential configured: set fortigate.password or fortigate.private_key_path")]
    MissingCredential,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
