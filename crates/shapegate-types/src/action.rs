//! External action types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Target status for the configured shaping policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapingState {
    Enable,
    Disable,
}

impl ShapingState {
    /// FortiOS keyword for `set status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapingState::Enable => "enable",
            ShapingState::Disable => "disable",
        }
    }
}

impl fmt::Display for ShapingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured outcome of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Exit status reported by the remote side, if it sent one.
    pub exit_status: Option<u32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed_ms: u64,
}

impl ActionResult {
    /// A command succeeded unless the remote reported a non-zero status.
    ///
    /// Appliance shells do not always send `exit-status`; a missing status
    /// counts as success.
    pub fn succeeded(&self) -> bool {
        matches!(self.exit_status, None | Some(0))
    }

    pub fn exit_status_label(&self) -> String {
        match self.exit_status {
            Some(code) => code.to_string(),
            None => "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_status: Option<u32>) -> ActionResult {
        ActionResult {
            exit_status,
            stdout: String::new(),
            stderr: String::new(),
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_succeeded() {
        assert!(result(Some(0)).succeeded());
        assert!(result(None).succeeded());
        assert!(!result(Some(1)).succeeded());
        assert!(!result(Some(255)).succeeded());
    }

    #[test]
    fn test_exit_status_label() {
        assert_eq!(result(Some(2)).exit_status_label(), "2");
        assert_eq!(result(None).exit_status_label(), "unknown");
    }

    #[test]
    fn test_shaping_state_serde() {
        let json = serde_json::to_string(&ShapingState::Disable).unwrap();
        assert_eq!(json, "\"disable\"");
        let parsed: ShapingState = serde_json::from_str("\"enable\"").unwrap();
        assert_eq!(parsed, ShapingState::Enable);
    }
}
