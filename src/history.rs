//! One-shot history snapshot from `GET {base}/api/messages`.
//!
//! ERROR HANDLING
//! ==============
//! Every failure (transport, non-2xx, malformed body) is returned as a
//! [`HistoryError`]. The caller treats it as non-fatal: the transcript simply
//! starts without history. There are no retries.

use frames::{ChatMessage, CodecError};
use tracing::debug;

use crate::config::{ChatConfig, Timeouts};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("history endpoint returned HTTP {0}")]
    Status(u16),
    #[error("malformed history body: {0}")]
    Decode(#[from] CodecError),
}

/// Build the HTTP client used for history requests.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] if the TLS backend cannot be
/// initialised.
pub fn build_http_client(timeouts: Timeouts) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .build()
}

#[derive(Clone, Debug)]
pub struct HistoryLoader {
    client: reqwest::Client,
    url: String,
}

impl HistoryLoader {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &ChatConfig) -> Self {
        Self { client, url: config.history_url() }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the history snapshot, preserving server order.
    ///
    /// # Errors
    ///
    /// See [`HistoryError`].
    pub async fn fetch(&self) -> Result<Vec<ChatMessage>, HistoryError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HistoryError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let messages = frames::decode_history(&body)?;
        debug!(url = %self.url, count = messages.len(), "history fetched");
        Ok(messages)
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
