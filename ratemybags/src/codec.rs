//! State token codec.
//!
//! A token is the base64url (unpadded) encoding of the session's JSON form.
//! Raw JSON objects are accepted on decode: older clients sent the JSON
//! percent-encoded, which the transport has already undone.

use crate::error::FrameError;
use crate::state::{SessionState, Step};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token does not hold a session state: {0}")]
    Malformed(String),

    /// Structurally valid, but the step is not one we know.
    #[error("unrecognized step '{0}'")]
    UnknownStep(String),
}

pub fn encode(state: &SessionState) -> Result<String, FrameError> {
    let json = serde_json::to_vec(state).map_err(FrameError::Encode)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn decode(token: &str) -> Result<SessionState, DecodeError> {
    let token = token.trim();
    let raw = if token.starts_with('{') {
        token.as_bytes().to_vec()
    } else {
        URL_SAFE_NO_PAD.decode(token.trim_end_matches('='))?
    };

    let value: Value =
        serde_json::from_slice(&raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(DecodeError::Malformed("expected a JSON object".to_string()));
    }

    match value.get("step") {
        Some(Value::String(name)) if Step::parse(name).is_some() => {}
        Some(Value::String(name)) => return Err(DecodeError::UnknownStep(name.clone())),
        Some(other) => return Err(DecodeError::UnknownStep(other.to_string())),
        None => return Err(DecodeError::UnknownStep(String::new())),
    }

    let state: SessionState =
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    state.validate().map_err(DecodeError::Malformed)?;
    Ok(state)
}
