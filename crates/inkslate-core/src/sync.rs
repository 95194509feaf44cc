//! WebSocket client for live sync.
//!
//! The wire protocol is whole-document: every change ships the full shape
//! sequence and receivers replace theirs with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Messages sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Announce which board this connection edits
    Join { board: String },
    /// The sender's complete shape sequence
    Shapes { shapes: Vec<Value> },
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A peer's complete shape sequence
    Shapes { shapes: Vec<Value> },
    /// Peer joined the board
    PeerJoined { peer_id: String },
    /// Peer left the board
    PeerLeft { peer_id: String },
    /// Error message
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Send failed: {0}")]
    Send(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from the WebSocket client
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Connected to server
    Connected,
    /// Disconnected from server
    Disconnected,
    /// A peer's document arrived
    ShapesReceived { shapes: Vec<Value> },
    /// A peer joined the board
    PeerJoined { peer_id: String },
    /// A peer left the board
    PeerLeft { peer_id: String },
    /// Error occurred
    Error { message: String },
}

/// Decode one text frame from the server. Malformed frames yield `None`.
pub fn parse_server_message(text: &str) -> Option<SyncEvent> {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(ServerMessage::Shapes { shapes }) => Some(SyncEvent::ShapesReceived { shapes }),
        Ok(ServerMessage::PeerJoined { peer_id }) => Some(SyncEvent::PeerJoined { peer_id }),
        Ok(ServerMessage::PeerLeft { peer_id }) => Some(SyncEvent::PeerLeft { peer_id }),
        Ok(ServerMessage::Error { message }) => Some(SyncEvent::Error { message }),
        Err(err) => {
            log::warn!("Dropping malformed sync message: {err}");
            None
        }
    }
}

/// Connect/send/receive/close primitives of a live-sync channel.
pub trait SyncTransport: Send {
    fn connect(&mut self, url: &str) -> SyncResult<()>;
    fn disconnect(&mut self);
    fn send(&self, msg: &str) -> SyncResult<()>;
    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<SyncEvent>;
    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

fn track_state(state: &mut ConnectionState, event: &SyncEvent) {
    match event {
        SyncEvent::Connected => *state = ConnectionState::Connected,
        SyncEvent::Disconnected => *state = ConnectionState::Disconnected,
        SyncEvent::Error { .. } => *state = ConnectionState::Error,
        _ => {}
    }
}

mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket client for native platforms.
    ///
    /// Uses a background thread for non-blocking operation.
    pub struct NativeWebSocket {
        state: ConnectionState,
        events: Vec<SyncEvent>,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<SyncEvent>>,
        _thread: Option<JoinHandle<()>>,
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                events: Vec::new(),
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }
    }

    fn run(url: String, cmd_rx: Receiver<WsCommand>, event_tx: Sender<SyncEvent>) {
        log::info!("WebSocket thread: connecting to {}", url);

        let (mut socket, response) = match connect(url.as_str()) {
            Ok(connected) => connected,
            Err(e) => {
                log::error!("WebSocket connection failed: {}", e);
                let _ = event_tx.send(SyncEvent::Error {
                    message: format!("Connection failed: {}", e),
                });
                return;
            }
        };
        log::info!("WebSocket connected, status: {}", response.status());
        let _ = event_tx.send(SyncEvent::Connected);

        // Short read timeout so outgoing commands are serviced between reads
        if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = socket.get_mut() {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }

        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(msg)) => {
                    log::debug!("WebSocket sending {} bytes", msg.len());
                    if let Err(e) = socket.send(Message::Text(msg)) {
                        log::error!("WebSocket send error: {}", e);
                        break;
                    }
                }
                Ok(WsCommand::Close) => {
                    log::info!("WebSocket close requested");
                    let _ = socket.close(None);
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    log::info!("WebSocket command channel disconnected");
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            match socket.read() {
                Ok(Message::Text(txt)) => {
                    if let Some(event) = parse_server_message(&txt) {
                        let _ = event_tx.send(event);
                    }
                }
                Ok(Message::Ping(data)) => {
                    let _ = socket.send(Message::Pong(data));
                }
                Ok(Message::Close(_)) => {
                    log::info!("WebSocket received close frame");
                    break;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    log::error!("WebSocket read error: {}", e);
                    break;
                }
            }
        }

        log::info!("WebSocket thread exiting");
        let _ = event_tx.send(SyncEvent::Disconnected);
    }

    impl SyncTransport for NativeWebSocket {
        fn connect(&mut self, url: &str) -> SyncResult<()> {
            if self.cmd_tx.is_some() {
                return Err(SyncError::AlreadyConnected);
            }

            let parsed_url = Url::parse(url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
            if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
                return Err(SyncError::InvalidUrl(format!(
                    "unsupported scheme: {}",
                    parsed_url.scheme()
                )));
            }

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<SyncEvent>();
            let url = url.to_string();
            let handle = thread::spawn(move || run(url, cmd_rx, event_tx));

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);
            Ok(())
        }

        fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        fn send(&self, msg: &str) -> SyncResult<()> {
            match &self.cmd_tx {
                Some(tx) => tx
                    .send(WsCommand::Send(msg.to_string()))
                    .map_err(|e| SyncError::Send(e.to_string())),
                None => Err(SyncError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            let mut finished = false;
            if let Some(rx) = &self.event_rx {
                loop {
                    match rx.try_recv() {
                        Ok(event) => {
                            track_state(&mut self.state, &event);
                            self.events.push(event);
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            finished = true;
                            break;
                        }
                    }
                }
            }
            if finished {
                // Socket thread has exited; the next connect starts a fresh one
                log::debug!("WebSocket thread finished");
                self.cmd_tx = None;
                self.event_rx = None;
                self._thread = None;
                if self.state != ConnectionState::Error {
                    self.state = ConnectionState::Disconnected;
                }
            }
            std::mem::take(&mut self.events)
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }
}

pub use native_client::NativeWebSocket;

/// In-process transport: records what is sent and replays queued events.
/// Used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    state: ConnectionState,
    sent: std::sync::Mutex<Vec<String>>,
    incoming: Vec<SyncEvent>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next `poll_events`.
    pub fn deliver(&mut self, event: SyncEvent) {
        self.incoming.push(event);
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl SyncTransport for LoopbackTransport {
    fn connect(&mut self, _url: &str) -> SyncResult<()> {
        if self.state == ConnectionState::Connected {
            return Err(SyncError::AlreadyConnected);
        }
        self.incoming.push(SyncEvent::Connected);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    fn send(&self, msg: &str) -> SyncResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(SyncError::NotConnected);
        }
        self.sent
            .lock()
            .map_err(|e| SyncError::Send(e.to_string()))?
            .push(msg.to_string());
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SyncEvent> {
        let events = std::mem::take(&mut self.incoming);
        for event in &events {
            track_state(&mut self.state, event);
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}
