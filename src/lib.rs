//! Real-time chat client core.
//!
//! Reconciles a one-shot history snapshot with a live socket stream into a
//! single ordered transcript, and exposes it to a presentation layer as
//! immutable [`ChatSnapshot`]s.

pub mod color;
pub mod config;
pub mod connection;
pub mod history;
pub mod live;
pub mod retry;
pub mod state;
pub mod transcript;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{ChatConfig, ConfigError};
pub use connection::ConnectionState;
pub use frames::{ChatMessage, CodecError};
pub use live::{ChatClient, ClientError};
pub use state::{Ambient, ChatSnapshot, ChatState, HistoryStatus, SendOutcome};
