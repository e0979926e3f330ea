//! Webhook receiver handler.
//!
//! Authenticates the request with the shared token, validates the playback
//! event and hands it to the shaping service. Enable events block until the
//! firewall command has finished; disable events only start a timer.

use std::time::{Duration, Instant};

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};

use shapegate_core::executor::RemoteExecutor;
use shapegate_core::service::EventOutcome;
use shapegate_infra::auth::{TOKEN_HEADER, verify_token};
use shapegate_types::event::WebhookPayload;

use crate::http::error::{AppError, RequestError};
use crate::http::response::{ApiResponse, request_id};
use crate::state::AppState;

/// POST /webhook/{uuid} - Receive a playback event.
///
/// Nothing is parsed before the token checks out, and nothing runs on the
/// firewall unless the body is a valid event. Success and error envelopes
/// carry the request id used in the logs.
pub async fn receive_webhook<E: RemoteExecutor + 'static>(
    State(state): State<AppState<E>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<Value>>, RequestError> {
    let start = Instant::now();
    let request_id = request_id();

    match process(&state, &headers, &body, &request_id).await {
        Ok(data) => {
            let elapsed = start.elapsed().as_millis() as u64;
            Ok(Json(ApiResponse::success(data, request_id, elapsed)))
        }
        Err(e) => Err(e.in_request(&request_id, start)),
    }
}

async fn process<E: RemoteExecutor + 'static>(
    state: &AppState<E>,
    headers: &HeaderMap,
    body: &Bytes,
    request_id: &str,
) -> Result<Value, AppError> {
    let provided = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
    verify_token(&state.token, provided)?;

    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Not provided");

    let payload = WebhookPayload::parse(body)?;
    tracing::info!(
        %request_id,
        event = %payload.event,
        wan_streams = payload.wan_streams,
        forwarded_for,
        "incoming webhook"
    );
    if let Some(raw) = &payload.rejected_wan_streams {
        tracing::warn!(value = %raw, "invalid wan_streams value, defaulting to 0");
    }

    let event = payload.event.as_str().to_string();
    let outcome = state
        .service
        .handle(&payload)
        .await
        .map_err(|source| AppError::Action {
            event: event.clone(),
            source,
        })?;

    let data = match outcome {
        EventOutcome::Enabled(result) => json!({
            "message": format!("Event {event} executed successfully"),
            "output": result.stdout,
            "exit_status": result.exit_status,
            "elapsed_ms": result.elapsed_ms,
        }),
        EventOutcome::DisableScheduled { delay } => json!({
            "message": format!(
                "Event {event} scheduled for disable after {} delay",
                describe_delay(delay)
            ),
            "delay_secs": delay.as_secs(),
        }),
        EventOutcome::Skipped { wan_streams } => json!({
            "message": format!("Event {event} ignored due to active wan_streams: {wan_streams}"),
        }),
        EventOutcome::Ignored => json!({
            "message": format!("Event {event} ignored"),
        }),
    };

    Ok(data)
}

/// "2-minute", "90-second".
fn describe_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}-minute", secs / 60)
    } else {
        format!("{secs}-second")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_delay() {
        assert_eq!(describe_delay(Duration::from_secs(120)), "2-minute");
        assert_eq!(describe_delay(Duration::from_secs(60)), "1-minute");
        assert_eq!(describe_delay(Duration::from_secs(90)), "90-second");
        assert_eq!(describe_delay(Duration::ZERO), "0-second");
    }
}
