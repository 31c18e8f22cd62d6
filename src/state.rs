//! Client-side chat state: transcript, ambient accent, connection and
//! history status.
//!
//! DESIGN
//! ======
//! `ChatState` is pure: no I/O, no clocks. The live session owns exactly one
//! instance and funnels every event (history result, inbound frame,
//! connection change, send request) through it, one at a time. The
//! presentation layer never sees the state directly; it receives
//! [`ChatSnapshot`] copies.
//!
//! The ambient colour that used to be a page-global side effect is an
//! explicit [`Ambient`] value carried in every snapshot.

use frames::{ChatMessage, CodecError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color;
use crate::connection::ConnectionState;
use crate::transcript::Transcript;

// =============================================================================
// AMBIENT
// =============================================================================

/// Most-recent-wins presentation accent derived from inbound frames.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambient {
    color: Option<String>,
}

impl Ambient {
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Whether the accent is dark; `false` when unset or unparseable.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.color
            .as_deref()
            .and_then(color::is_dark)
            .unwrap_or(false)
    }

    fn set(&mut self, color: &str) {
        self.color = Some(color.to_owned());
    }
}

// =============================================================================
// HISTORY STATUS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum HistoryStatus {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    Failed(String),
}

// =============================================================================
// SEND OUTCOME
// =============================================================================

/// Result of a send attempt. None of these is an error condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// The trimmed text was written to the socket.
    Sent,
    /// Input was empty after trimming; nothing sent.
    Empty,
    /// The connection is not open; nothing sent, nothing queued.
    NotOpen,
    /// The transport rejected the write.
    Failed,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Immutable view of the chat handed to the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSnapshot {
    pub messages: Vec<ChatMessage>,
    pub ambient: Ambient,
    pub connection: ConnectionState,
    pub history: HistoryStatus,
}

impl ChatSnapshot {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.history == HistoryStatus::Loading
    }
}

// =============================================================================
// CHAT STATE
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct ChatState {
    transcript: Transcript,
    ambient: Ambient,
    connection: ConnectionState,
    history: HistoryStatus,
}

impl ChatState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn ambient(&self) -> &Ambient {
        &self.ambient
    }

    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStatus {
        &self.history
    }

    /// Mark the history request as in flight.
    pub fn begin_history(&mut self) {
        if self.history == HistoryStatus::NotStarted {
            self.history = HistoryStatus::Loading;
        }
    }

    /// Seed the transcript with the history batch.
    ///
    /// Returns `false` if history had already been applied.
    pub fn finish_history(&mut self, messages: Vec<ChatMessage>) -> bool {
        if !self.transcript.seed(messages) {
            warn!("history already applied; ignoring second batch");
            return false;
        }
        self.history = HistoryStatus::Loaded;
        true
    }

    /// Record a failed history load. The transcript keeps no history entries.
    pub fn fail_history(&mut self, reason: impl Into<String>) {
        if !self.transcript.is_seeded() {
            self.history = HistoryStatus::Failed(reason.into());
        }
    }

    /// Decode one inbound frame and apply it.
    ///
    /// On success the ambient colour and the transcript are both updated;
    /// on failure neither is.
    ///
    /// # Errors
    ///
    /// Returns the [`CodecError`] of a malformed frame.
    pub fn apply_frame(&mut self, raw: &str) -> Result<&ChatMessage, CodecError> {
        let frame = frames::decode_inbound(raw)?;
        Ok(self.apply_message(frame.into()))
    }

    /// Apply an already-decoded inbound message.
    pub fn apply_message(&mut self, message: ChatMessage) -> &ChatMessage {
        self.ambient.set(&message.sender);
        self.transcript.push(message);
        // Just pushed, so the transcript is non-empty.
        let last = self.transcript.len() - 1;
        &self.transcript.as_slice()[last]
    }

    /// Move the connection to `next` if the lifecycle allows it.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    pub fn set_connection(&mut self, next: ConnectionState) -> bool {
        if self.connection == next {
            return true;
        }
        if !self.connection.can_transition_to(next) {
            warn!(from = %self.connection, to = %next, "rejected connection transition");
            return false;
        }
        self.connection = next;
        true
    }

    /// Validate user input for sending.
    ///
    /// Returns the trimmed outbound text, or the outcome explaining why
    /// nothing may be sent.
    ///
    /// # Errors
    ///
    /// [`SendOutcome::Empty`] for blank input, [`SendOutcome::NotOpen`] when
    /// the connection is not open.
    pub fn prepare_send<'a>(&self, input: &'a str) -> Result<&'a str, SendOutcome> {
        let text = frames::encode_outbound(input).ok_or(SendOutcome::Empty)?;
        if !self.connection.is_open() {
            return Err(SendOutcome::NotOpen);
        }
        Ok(text)
    }

    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.transcript.as_slice().to_vec(),
            ambient: self.ambient.clone(),
            connection: self.connection,
            history: self.history.clone(),
        }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
