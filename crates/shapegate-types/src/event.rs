//! Webhook payload types.
//!
//! The media server posts a JSON object with an `event` name and an optional
//! `wan_streams` count. Parsing is strict about the event and lenient about
//! the stream count: an unusable count falls back to 0 and the raw value is
//! kept so the receiver can report it.

use std::fmt;

use serde_json::Value;

use crate::error::ValidationError;

/// Playback event reported by the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Start,
    Resume,
    Pause,
    Stop,
    /// Any other event name, lowercased.
    Other(String),
}

impl PlaybackEvent {
    /// Map an event name (case-insensitive) to a playback event.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        match lower.as_str() {
            "playback_start" => PlaybackEvent::Start,
            "playback_resume" => PlaybackEvent::Resume,
            "playback_pause" => PlaybackEvent::Pause,
            "playback_stop" => PlaybackEvent::Stop,
            _ => PlaybackEvent::Other(lower),
        }
    }

    /// Wire name of the event.
    pub fn as_str(&self) -> &str {
        match self {
            PlaybackEvent::Start => "playback_start",
            PlaybackEvent::Resume => "playback_resume",
            PlaybackEvent::Pause => "playback_pause",
            PlaybackEvent::Stop => "playback_stop",
            PlaybackEvent::Other(name) => name,
        }
    }
}

impl fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated webhook body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookPayload {
    pub event: PlaybackEvent,
    /// Number of active WAN streams (0 when absent or unusable).
    pub wan_streams: i64,
    /// Raw `wan_streams` value when it could not be read as a number.
    pub rejected_wan_streams: Option<String>,
}

impl WebhookPayload {
    /// Parse and validate a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::EmptyBody);
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

        let Value::Object(map) = value else {
            return Err(ValidationError::NotAnObject);
        };

        let event = match map.get("event") {
            None => return Err(ValidationError::MissingEvent),
            Some(Value::String(name)) if !name.trim().is_empty() => PlaybackEvent::from_name(name),
            Some(other) => return Err(ValidationError::InvalidEvent(other.to_string())),
        };

        let (wan_streams, rejected_wan_streams) = match map.get("wan_streams") {
            None => (0, None),
            Some(raw) => match coerce_stream_count(raw) {
                Some(n) => (n, None),
                None => (0, Some(raw.to_string())),
            },
        };

        Ok(Self {
            event,
            wan_streams,
            rejected_wan_streams,
        })
    }
}

/// Read a stream count from a JSON value.
///
/// Integers pass through, floats truncate toward zero, booleans are 0/1 and
/// numeric strings are parsed. Everything else is rejected.
fn coerce_stream_count(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
