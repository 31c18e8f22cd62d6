//! Shared message model and JSON codec for the chat wire protocol.
//!
//! This crate owns the wire representation used by the client: the history
//! snapshot served over HTTP, inbound socket frames, and outbound text.
//! Decoding goes through typed serde schemas so that callers get either a
//! typed value or a [`CodecError`], never a partially-trusted JSON blob.

use serde::{Deserialize, Serialize};

/// Error returned by [`decode_history`] and [`decode_inbound`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload is not valid JSON or does not match the expected schema
    /// (missing field, wrong field type, wrong top-level shape).
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The payload bytes are not UTF-8 text.
    #[error("payload is not valid UTF-8")]
    NotUtf8,
}

/// A single chat message as held in the transcript.
///
/// `sender` doubles as the display colour tag of the message origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self { sender: sender.into(), content: content.into() }
    }
}

/// A live frame pushed by the server over the socket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFrame {
    /// `#RRGGBB` colour of the sender. Not validated here.
    pub color: String,
    /// Message body.
    pub message: String,
}

impl From<InboundFrame> for ChatMessage {
    fn from(frame: InboundFrame) -> Self {
        Self { sender: frame.color, content: frame.message }
    }
}

/// Decode the `/api/messages` response body.
///
/// The whole body is rejected if any record is malformed.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when the body is not a JSON array of
/// `{sender, content}` string records.
pub fn decode_history(bytes: &[u8]) -> Result<Vec<ChatMessage>, CodecError> {
    Ok(serde_json::from_slice::<Vec<ChatMessage>>(bytes)?)
}

/// Decode one inbound text frame.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when the text is not a JSON object with
/// string `color` and `message` fields.
pub fn decode_inbound(text: &str) -> Result<InboundFrame, CodecError> {
    Ok(serde_json::from_str::<InboundFrame>(text)?)
}

/// Decode one inbound binary frame carrying UTF-8 JSON.
///
/// # Errors
///
/// Returns [`CodecError::NotUtf8`] for non-text bytes, otherwise the same
/// errors as [`decode_inbound`].
pub fn decode_inbound_bytes(bytes: &[u8]) -> Result<InboundFrame, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::NotUtf8)?;
    decode_inbound(text)
}

/// Encode user input as an outbound frame body.
///
/// Outbound frames are the raw trimmed text, not JSON. Returns `None` when
/// nothing but whitespace remains.
#[must_use]
pub fn encode_outbound(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
