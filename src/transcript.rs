//! Ordered, append-only chat transcript.
//!
//! DESIGN
//! ======
//! Display order is observation order: the history batch first, in server
//! order, then live messages in delivery order. Live messages are appended
//! the moment they arrive, even while history is still loading; when the
//! batch lands it is placed in front of them. There is no dedup and no
//! reordering beyond that.

use frames::ChatMessage;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    history_len: usize,
    seeded: bool,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the history batch ahead of any live messages already appended.
    ///
    /// Returns `false` (leaving the transcript untouched) if history was
    /// already seeded.
    pub fn seed(&mut self, history: Vec<ChatMessage>) -> bool {
        if self.seeded {
            return false;
        }
        let live = std::mem::replace(&mut self.messages, history);
        self.history_len = self.messages.len();
        self.messages.extend(live);
        self.seeded = true;
        true
    }

    /// Append one live message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Number of leading entries that came from the history batch.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "transcript_test.rs"]
mod tests;
