//! Application error type mapping to HTTP status codes and envelope format.

use std::time::Instant;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use shapegate_types::error::{ActionError, AuthError, ValidationError};

use crate::http::response::{ApiErrorDetail, ApiResponse, request_id};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Unauthorized(AuthError),
    Validation(ValidationError),
    /// The enable action failed; carries whatever output was captured.
    Action { event: String, source: ActionError },
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Unauthorized(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Unauthorized(e) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string(), None)
            }
            AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string(), None)
            }
            AppError::Action { event, source } => {
                let (status, code) = match source {
                    ActionError::CommandFailed(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "ACTION_FAILED")
                    }
                    ActionError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "ACTION_TIMEOUT"),
                    ActionError::Connect { .. }
                    | ActionError::Authentication { .. }
                    | ActionError::Channel(_) => (StatusCode::BAD_GATEWAY, "SSH_ERROR"),
                };
                let details = match source.result() {
                    Some(result) => json!({
                        "event": event,
                        "exit_status": result.exit_status,
                        "stdout": result.stdout,
                        "stderr": result.stderr,
                        "elapsed_ms": result.elapsed_ms,
                    }),
                    None => json!({ "event": event }),
                };
                (
                    status,
                    code,
                    format!("Event {event} failed: {source}"),
                    Some(details),
                )
            }
        }
    }
}

/// An `AppError` tied to the request it ended, so the envelope carries the
/// same `request_id` the handler logged.
#[derive(Debug)]
pub struct RequestError {
    pub request_id: String,
    pub response_time_ms: u64,
    pub error: AppError,
}

impl AppError {
    pub fn in_request(self, request_id: &str, started: Instant) -> RequestError {
        RequestError {
            request_id: request_id.to_string(),
            response_time_ms: started.elapsed().as_millis() as u64,
            error: self,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.error.parts();
        let request_id = self.request_id;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => {
                tracing::warn!(%request_id, code, %message, "webhook rejected");
            }
            _ => tracing::error!(%request_id, code, %message, "webhook action failed"),
        }

        let body = ApiResponse::error(
            ApiErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
            request_id,
            self.response_time_ms,
        );

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        RequestError {
            request_id: request_id(),
            response_time_ms: 0,
            error: self,
        }
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shapegate_types::action::ActionResult;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(AuthError::InvalidToken.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ValidationError::EmptyBody.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Action {
                event: "playback_start".to_string(),
                source: ActionError::Timeout(Duration::from_secs(5)),
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(AppError::Action {
                event: "playback_start".to_string(),
                source: ActionError::Channel("closed".to_string()),
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_command_failure_details_carry_output() {
        let err = AppError::Action {
            event: "playback_resume".to_string(),
            source: ActionError::CommandFailed(ActionResult {
                exit_status: Some(1),
                stdout: "edit 17".to_string(),
                stderr: "Command fail. Return code -61".to_string(),
                elapsed_ms: 40,
            }),
        };
        let (status, code, message, details) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "ACTION_FAILED");
        assert!(message.starts_with("Event playback_resume failed"));
        let details = details.unwrap();
        assert_eq!(details["exit_status"], 1);
        assert_eq!(details["stderr"], "Command fail. Return code -61");
    }

    #[test]
    fn test_request_error_keeps_request_id() {
        let started = Instant::now();
        let err = AppError::from(ValidationError::MissingEvent).in_request("req-42", started);
        assert_eq!(err.request_id, "req-42");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
