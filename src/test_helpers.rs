//! In-process chat backend for network tests.
//!
//! Serves `GET /api/messages` with a configurable reply and a WebSocket at
//! `/ws` whose outbound frames are scripted by the test. Text frames sent by
//! the client are recorded, and optionally echoed back as inbound frames the
//! way the real backend does.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::{ChatConfig, Timeouts};
use crate::state::ChatSnapshot;

#[derive(Clone, Debug)]
pub struct HistoryReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl HistoryReply {
    pub fn ok(body: &str) -> Self {
        Self { status: StatusCode::OK, body: body.to_owned(), delay: Duration::ZERO }
    }

    pub fn empty() -> Self {
        Self::ok("[]")
    }

    pub fn status(status: StatusCode) -> Self {
        Self { status, body: String::new(), delay: Duration::ZERO }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
pub enum ServerFrame {
    Text(String),
    Close,
}

#[derive(Clone)]
struct MockState {
    history: HistoryReply,
    outbound: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<ServerFrame>>>,
    received: mpsc::UnboundedSender<String>,
    connections: Arc<AtomicUsize>,
    echo_color: Option<String>,
}

pub struct MockServer {
    addr: SocketAddr,
    frames: mpsc::UnboundedSender<ServerFrame>,
    received: mpsc::UnboundedReceiver<String>,
    connections: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(history: HistoryReply) -> Self {
        Self::spawn(history, None).await
    }

    /// Like [`MockServer::start`], but every text frame received from the
    /// client is broadcast back as `{"color": color, "message": text}`.
    pub async fn start_echo(history: HistoryReply, color: &str) -> Self {
        Self::spawn(history, Some(color.to_owned())).await
    }

    async fn spawn(history: HistoryReply, echo_color: Option<String>) -> Self {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (received_tx, received_rx) = mpsc::unbounded_channel();
        let connections = Arc::new(AtomicUsize::new(0));

        let state = MockState {
            history,
            outbound: Arc::new(tokio::sync::Mutex::new(frames_rx)),
            received: received_tx,
            connections: connections.clone(),
            echo_color,
        };
        let app = Router::new()
            .route("/api/messages", get(history_handler))
            .route("/ws", get(ws_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, frames: frames_tx, received: received_rx, connections, task }
    }

    pub fn http_base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn socket_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn config(&self) -> ChatConfig {
        let mut config = ChatConfig::new(&self.http_base_url(), &self.socket_url()).expect("mock config");
        config.timeouts = Timeouts { request: Duration::from_secs(5), connect: Duration::from_secs(2) };
        config
    }

    /// Queue a raw inbound text frame for the connected (or next) client.
    pub fn push(&self, text: &str) {
        self.frames
            .send(ServerFrame::Text(text.to_owned()))
            .expect("mock server alive");
    }

    pub fn push_message(&self, color: &str, message: &str) {
        let frame = serde_json::json!({ "color": color, "message": message });
        self.push(&frame.to_string());
    }

    /// Close the current socket from the server side.
    pub fn close_socket(&self) {
        self.frames.send(ServerFrame::Close).expect("mock server alive");
    }

    pub async fn next_received(&mut self, within: Duration) -> Option<String> {
        timeout(within, self.received.recv()).await.ok().flatten()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn history_handler(State(state): State<MockState>) -> Response {
    if !state.history.delay.is_zero() {
        tokio::time::sleep(state.history.delay).await;
    }
    (state.history.status, state.history.body.clone()).into_response()
}

async fn ws_handler(State(state): State<MockState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: MockState) {
    state.connections.fetch_add(1, Ordering::SeqCst);
    let mut outbound = state.outbound.lock().await;

    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let text = text.as_str().to_owned();
                    let _ = state.received.send(text.clone());
                    if let Some(color) = &state.echo_color {
                        let echo = serde_json::json!({ "color": color, "message": text });
                        if socket.send(Message::Text(echo.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            frame = outbound.recv() => match frame {
                Some(ServerFrame::Text(text)) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(ServerFrame::Close) | None => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    listener.local_addr().expect("probe addr")
}

/// Wait until a published snapshot satisfies `pred`.
pub async fn wait_for_snapshot(
    rx: &mut watch::Receiver<ChatSnapshot>,
    what: &str,
    pred: impl FnMut(&ChatSnapshot) -> bool,
) -> ChatSnapshot {
    let found = timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
    match found {
        Ok(snapshot) => (*snapshot).clone(),
        Err(_) => panic!("session ended while waiting for {what}"),
    }
}
