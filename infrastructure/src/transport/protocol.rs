//! Wire classification of server frames.
//!
//! Every text frame from the server is JSON. A frame whose `type` is
//! `"error"` is a control frame; any other frame with a string `message` is a
//! content frame, optionally carrying the conversation's `session_id`.
//! Anything else is malformed and never reaches the engine.

use parley_domain::{IncomingFrame, SessionId};
use serde_json::Value;
use thiserror::Error;

/// Why a frame could not be classified
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame has no string `message`")]
    MissingMessage,

    #[error("invalid session_id: {0}")]
    InvalidSessionId(Value),
}

/// Parse and classify one text frame.
pub fn parse_frame(text: &str) -> Result<IncomingFrame, FrameError> {
    let value: Value = serde_json::from_str(text)?;
    classify_frame(&value)
}

/// Classify an already-decoded frame.
pub fn classify_frame(json: &Value) -> Result<IncomingFrame, FrameError> {
    let object = json.as_object().ok_or(FrameError::NotAnObject)?;
    let message = object
        .get("message")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingMessage)?
        .to_string();

    if object.get("type").and_then(Value::as_str) == Some("error") {
        return Ok(IncomingFrame::Control { message });
    }

    let session_id = match object.get("session_id") {
        None | Some(Value::Null) => None,
        // A blank id carries no identity; the content still counts.
        Some(Value::String(raw)) if raw.trim().is_empty() => None,
        Some(raw) => Some(
            serde_json::from_value::<SessionId>(raw.clone())
                .map_err(|_| FrameError::InvalidSessionId(raw.clone()))?,
        ),
    };
    Ok(IncomingFrame::Content {
        message,
        session_id,
    })
}
