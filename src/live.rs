//! Live stream session: the persistent socket, the one-shot history fetch and
//! user commands, serialized through a single task.
//!
//! DESIGN
//! ======
//! `ChatClient::start` spawns one session task that owns the socket and the
//! only `ChatState`. The task runs a `select!` loop over four sources:
//! - the history fetch (one-shot, never retried)
//! - the socket handshake, then inbound socket frames
//! - the reconnect timer (only armed when a reconnect policy is enabled)
//! - commands from `ChatClient` handles (send / close)
//!
//! Handlers run one at a time, so state mutations never interleave. After
//! every event the session publishes a `ChatSnapshot` on a watch channel.
//! Live frames are applied the moment they arrive; they never wait for
//! history.
//!
//! LIFECYCLE
//! =========
//! 1. Start → connection `Connecting`, history `Loading`
//! 2. Handshake → `Open` (or `Closed` on failure)
//! 3. Inbound text frames → `ChatState::apply_frame`; malformed ones dropped
//! 4. Transport close → `Closed`; reconnect only if the policy allows
//! 5. `close()` or dropping every handle → close frame sent, `Closed`; a
//!    history fetch still in flight is dropped and never applied

use std::future::Future;
use std::time::Duration;

use frames::ChatMessage;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::connection::ConnectionState;
use crate::history::{HistoryError, HistoryLoader, build_http_client};
use crate::retry::Backoff;
use crate::state::{ChatSnapshot, ChatState, SendOutcome};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type HistoryFuture = BoxFuture<'static, Result<Vec<ChatMessage>, HistoryError>>;
type ConnectFuture = BoxFuture<'static, Result<Socket, LiveError>>;

const COMMAND_BUFFER: usize = 32;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket handshake timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

// =============================================================================
// CLIENT HANDLE
// =============================================================================

enum Command {
    Send { text: String, reply: oneshot::Sender<SendOutcome> },
    Close,
}

/// Handle to a running chat session.
///
/// Dropping the handle ends the session and closes the socket, exactly like
/// [`ChatClient::close`] but without waiting for it.
pub struct ChatClient {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ChatSnapshot>,
    task: JoinHandle<()>,
}

impl ChatClient {
    /// Start the session: issue the history request and open the socket.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClient`] if the HTTP client cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(config: ChatConfig) -> Result<Self, ClientError> {
        let http = build_http_client(config.timeouts)?;
        let history = HistoryLoader::new(http, &config);

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots_tx, snapshots_rx) = watch::channel(ChatSnapshot::default());

        let session = Session {
            config,
            history,
            state: ChatState::new(),
            snapshots: snapshots_tx,
            commands: commands_rx,
        };
        let task = tokio::spawn(session.run());

        Ok(Self { commands: commands_tx, snapshots: snapshots_rx, task })
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified whenever the snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshots.clone()
    }

    /// Send the trimmed contents of `input` as one outbound frame.
    ///
    /// `input` is cleared only when the frame was written. Nothing is
    /// appended to the transcript; the message shows up once the server
    /// echoes it back.
    pub async fn send_message(&self, input: &mut String) -> SendOutcome {
        if frames::encode_outbound(input).is_none() {
            return SendOutcome::Empty;
        }

        let (reply, outcome) = oneshot::channel();
        let command = Command::Send { text: input.clone(), reply };
        if self.commands.send(command).await.is_err() {
            return SendOutcome::NotOpen;
        }

        let outcome = outcome.await.unwrap_or(SendOutcome::NotOpen);
        if outcome == SendOutcome::Sent {
            input.clear();
        }
        outcome
    }

    /// Close the socket, end the session and return the final snapshot.
    pub async fn close(self) -> ChatSnapshot {
        let _ = self.commands.send(Command::Close).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "chat session task failed");
        }
        self.snapshots.borrow().clone()
    }
}

// =============================================================================
// SESSION
// =============================================================================

struct Session {
    config: ChatConfig,
    history: HistoryLoader,
    state: ChatState,
    snapshots: watch::Sender<ChatSnapshot>,
    commands: mpsc::Receiver<Command>,
}

impl Session {
    async fn run(self) {
        let Self { config, history, mut state, snapshots, mut commands } = self;
        let mut backoff = Backoff::new(config.reconnect);

        info!(url = %history.url(), "loading history");
        let mut pending_history: Option<HistoryFuture> = Some(async move { history.fetch().await }.boxed());
        state.begin_history();

        info!(url = %config.socket_url, "connecting websocket");
        let mut pending_connect: Option<ConnectFuture> = Some(connect(&config));
        state.set_connection(ConnectionState::Connecting);
        publish(&snapshots, &state);

        let mut socket: Option<Socket> = None;
        let mut retry_at: Option<Instant> = None;

        loop {
            tokio::select! {
                result = poll_slot(&mut pending_history) => {
                    pending_history = None;
                    match result {
                        Ok(messages) => {
                            info!(count = messages.len(), "history loaded");
                            state.finish_history(messages);
                        }
                        Err(e) => {
                            warn!(error = %e, "history load failed; continuing without history");
                            state.fail_history(e.to_string());
                        }
                    }
                }
                result = poll_slot(&mut pending_connect) => {
                    pending_connect = None;
                    match result {
                        Ok(stream) => {
                            info!(url = %config.socket_url, "websocket connected");
                            state.set_connection(ConnectionState::Open);
                            socket = Some(stream);
                            backoff.reset();
                        }
                        Err(e) => {
                            warn!(error = %e, "websocket connect failed");
                            state.set_connection(ConnectionState::Closed);
                            retry_at = schedule_retry(&mut backoff);
                        }
                    }
                }
                message = next_message(&mut socket) => {
                    let closed = match message {
                        Some(Ok(WsMessage::Text(text))) => {
                            apply_inbound(&mut state, text.as_str());
                            false
                        }
                        Some(Ok(WsMessage::Binary(bytes))) => {
                            apply_inbound_bytes(&mut state, &bytes);
                            false
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            info!(?frame, "websocket closed by server");
                            true
                        }
                        Some(Ok(_)) => false,
                        Some(Err(e)) => {
                            warn!(error = %e, "websocket read failed");
                            true
                        }
                        None => {
                            info!("websocket stream ended");
                            true
                        }
                    };
                    if closed {
                        release(&mut socket).await;
                        state.set_connection(ConnectionState::Closed);
                        retry_at = schedule_retry(&mut backoff);
                    }
                }
                () = sleep_until(retry_at) => {
                    retry_at = None;
                    info!(attempt = backoff.attempts(), url = %config.socket_url, "reconnecting websocket");
                    state.set_connection(ConnectionState::Connecting);
                    pending_connect = Some(connect(&config));
                }
                command = commands.recv() => match command {
                    Some(Command::Send { text, reply }) => {
                        let outcome = send_text(&state, socket.as_mut(), &text).await;
                        let _ = reply.send(outcome);
                    }
                    Some(Command::Close) | None => break,
                },
            }
            publish(&snapshots, &state);
        }

        // A result that lands after release must never touch the state.
        if pending_history.take().is_some() {
            state.fail_history("cancelled before completion");
        }
        drop(pending_connect);
        release(&mut socket).await;
        state.set_connection(ConnectionState::Closed);
        publish(&snapshots, &state);
        info!("chat session released");
    }
}

fn publish(snapshots: &watch::Sender<ChatSnapshot>, state: &ChatState) {
    snapshots.send_if_modified(|current| {
        let next = state.snapshot();
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

fn connect(config: &ChatConfig) -> ConnectFuture {
    open_socket(config.socket_url.clone(), config.timeouts.connect).boxed()
}

async fn open_socket(url: String, handshake_timeout: Duration) -> Result<Socket, LiveError> {
    let (socket, response) = tokio::time::timeout(handshake_timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| LiveError::Timeout(handshake_timeout))?
        .map_err(|error| LiveError::Connect(Box::new(error)))?;
    debug!(status = %response.status(), "websocket handshake complete");
    Ok(socket)
}

/// Send a close frame if the socket is still held. Safe to call when the
/// closing handshake has already started.
async fn release(socket: &mut Option<Socket>) {
    let Some(mut stream) = socket.take() else {
        return;
    };
    if let Err(e) = stream.close(None).await {
        debug!(error = %e, "websocket close after shutdown began");
    }
}

fn schedule_retry(backoff: &mut Backoff) -> Option<Instant> {
    let delay = backoff.next_delay()?;
    info!(?delay, attempt = backoff.attempts(), "scheduling reconnect");
    Some(Instant::now() + delay)
}

fn apply_inbound(state: &mut ChatState, raw: &str) {
    match state.apply_frame(raw) {
        Ok(message) => debug!(sender = %message.sender, "inbound message"),
        Err(e) => warn!(error = %e, "dropping malformed inbound frame"),
    }
}

fn apply_inbound_bytes(state: &mut ChatState, bytes: &[u8]) {
    match frames::decode_inbound_bytes(bytes) {
        Ok(frame) => {
            let message = state.apply_message(frame.into());
            debug!(sender = %message.sender, "inbound binary message");
        }
        Err(e) => warn!(error = %e, "dropping malformed binary frame"),
    }
}

async fn send_text(state: &ChatState, socket: Option<&mut Socket>, input: &str) -> SendOutcome {
    let text = match state.prepare_send(input) {
        Ok(text) => text,
        Err(outcome) => {
            debug!(?outcome, "send skipped");
            return outcome;
        }
    };
    let Some(socket) = socket else {
        return SendOutcome::NotOpen;
    };

    match socket.send(WsMessage::text(text.to_owned())).await {
        Ok(()) => {
            debug!(len = text.len(), "outbound message sent");
            SendOutcome::Sent
        }
        Err(e) => {
            warn!(error = %e, "websocket send failed");
            SendOutcome::Failed
        }
    }
}

async fn poll_slot<F>(slot: &mut Option<F>) -> F::Output
where
    F: Future + Unpin,
{
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn next_message(
    socket: &mut Option<Socket>,
) -> Option<Result<WsMessage, tokio_tungstenite::tungstenite::Error>> {
    match socket {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "live_test.rs"]
mod tests;
