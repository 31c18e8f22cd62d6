use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;
use freechat::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, Timeouts};
use freechat::retry::ReconnectPolicy;
use freechat::{ChatClient, ChatConfig, ChatMessage, ChatSnapshot, ConnectionState, HistoryStatus, SendOutcome, color};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] freechat::ConfigError),
    #[error(transparent)]
    Client(#[from] freechat::ClientError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "freechat", about = "Terminal client for a real-time chat room")]
struct Cli {
    /// Base URL serving `GET /api/messages`.
    #[arg(long, env = "FREECHAT_HTTP_BASE_URL")]
    http_base_url: String,

    /// WebSocket endpoint for the live stream.
    #[arg(long, env = "FREECHAT_SOCKET_URL")]
    socket_url: String,

    #[arg(long, env = "FREECHAT_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[arg(long, env = "FREECHAT_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    /// Reconnect attempts after the socket closes; 0 keeps it closed.
    #[arg(long, env = "FREECHAT_RECONNECT_ATTEMPTS", default_value_t = 0)]
    reconnect_attempts: u32,
}

impl Cli {
    fn into_config(self) -> Result<ChatConfig, CliError> {
        let mut config = ChatConfig::new(&self.http_base_url, &self.socket_url)?;
        config.timeouts = Timeouts {
            request: Duration::from_secs(self.request_timeout_secs),
            connect: Duration::from_secs(self.connect_timeout_secs),
        };
        config.reconnect = ReconnectPolicy::with_attempts(self.reconnect_attempts);
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    // Load .env before clap reads env fallbacks.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let config = Cli::parse().into_config()?;
    run(config).await
}

async fn run(config: ChatConfig) -> Result<(), CliError> {
    let client = ChatClient::start(config)?;
    let mut snapshots = client.subscribe();
    let mut view = TerminalView::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                view.render(&snapshot)?;
            }
            line = lines.next_line() => {
                let Some(mut input) = line? else { break };
                match client.send_message(&mut input).await {
                    SendOutcome::Sent | SendOutcome::Empty => {}
                    SendOutcome::NotOpen => eprintln!("[not connected; message dropped]"),
                    SendOutcome::Failed => eprintln!("[send failed; message dropped]"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let last = client.close().await;
    view.render(&last)?;
    Ok(())
}

/// Prints transcript changes to stdout and status changes to stderr.
#[derive(Default)]
struct TerminalView {
    printed: Vec<ChatMessage>,
    connection: ConnectionState,
    history: HistoryStatus,
}

impl TerminalView {
    fn render(&mut self, snapshot: &ChatSnapshot) -> io::Result<()> {
        if snapshot.connection != self.connection {
            eprintln!("[{}]", snapshot.connection);
            self.connection = snapshot.connection;
        }
        if snapshot.history != self.history {
            match &snapshot.history {
                HistoryStatus::Loading => eprintln!("[loading history]"),
                HistoryStatus::Failed(reason) => eprintln!("[history unavailable: {reason}]"),
                HistoryStatus::NotStarted | HistoryStatus::Loaded => {}
            }
            self.history = snapshot.history.clone();
        }

        let mut out = io::stdout().lock();
        let fresh = if snapshot.messages.starts_with(&self.printed) {
            &snapshot.messages[self.printed.len()..]
        } else {
            // History landed ahead of already-printed live messages.
            writeln!(out, "--- transcript ---")?;
            snapshot.messages.as_slice()
        };
        for message in fresh {
            writeln!(out, "{}", paint(message))?;
        }
        out.flush()?;

        self.printed.clone_from(&snapshot.messages);
        Ok(())
    }
}

fn paint(message: &ChatMessage) -> String {
    match color::parse_hex_rgb(&message.sender) {
        Some((r, g, b)) => format!("\x1b[38;2;{r};{g};{b}m{}\x1b[0m", message.content),
        None => message.content.clone(),
    }
}
