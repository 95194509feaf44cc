//! Live sync between a canvas and its peers.
//!
//! Last whole document wins: there is no merge, so concurrent edits from two
//! peers can overwrite each other.

use crate::canvas::Canvas;
use crate::sync::{ClientMessage, NativeWebSocket, SyncEvent, SyncResult, SyncTransport};
use serde_json::Value;

/// Keeps one board's shapes in step with a live-sync channel.
pub struct LiveSync {
    board: String,
    transport: Box<dyn SyncTransport>,
    peers: usize,
    /// Whether the local document may be pushed as soon as the channel opens.
    push_on_connect: bool,
}

impl LiveSync {
    /// Live sync for `board` over a native WebSocket.
    pub fn new(board: impl Into<String>) -> Self {
        Self::with_transport(board, Box::new(NativeWebSocket::new()))
    }

    pub fn with_transport(board: impl Into<String>, transport: Box<dyn SyncTransport>) -> Self {
        Self {
            board: board.into(),
            transport,
            peers: 0,
            push_on_connect: true,
        }
    }

    pub fn board(&self) -> &str {
        &self.board
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Peers currently known to share the board.
    pub fn peer_count(&self) -> usize {
        self.peers
    }

    pub fn connect(&mut self, url: &str) -> SyncResult<()> {
        self.transport.connect(url)
    }

    pub fn disconnect(&mut self) {
        self.transport.disconnect();
        self.peers = 0;
    }

    /// Join on connect but hold the document back until [`LiveSync::publish`].
    /// The server treats every push as the board's new state, so a document
    /// that has not loaded yet must not be sent.
    pub fn defer_initial_push(&mut self) {
        self.push_on_connect = false;
    }

    /// The local document is authoritative: push it now, and on every later
    /// connect.
    pub fn publish(&mut self, shapes: Vec<Value>) {
        self.push_on_connect = true;
        self.broadcast(shapes);
    }

    fn send(&self, message: &ClientMessage) -> SyncResult<()> {
        let text = serde_json::to_string(message)
            .map_err(|e| crate::sync::SyncError::Send(e.to_string()))?;
        self.transport.send(&text)
    }

    /// Push the full local shape list to peers. Does nothing while offline.
    pub fn broadcast(&self, shapes: Vec<Value>) {
        if !self.transport.is_connected() {
            return;
        }
        if let Err(err) = self.send(&ClientMessage::Shapes { shapes }) {
            log::warn!("Live sync send failed: {err}");
        }
    }

    /// Handle pending channel events against `canvas`. Returns true if a peer
    /// replaced the document.
    pub fn poll(&mut self, canvas: &mut Canvas) -> bool {
        let mut replaced = false;
        for event in self.transport.poll_events() {
            match event {
                SyncEvent::Connected => {
                    log::info!("Live sync connected for board {}", self.board);
                    let join = ClientMessage::Join {
                        board: self.board.clone(),
                    };
                    if let Err(err) = self.send(&join) {
                        log::warn!("Live sync join failed: {err}");
                    }
                    if self.push_on_connect {
                        self.broadcast(canvas.to_records());
                    } else {
                        log::debug!("Holding initial push for {} until it loads", self.board);
                    }
                }
                SyncEvent::ShapesReceived { shapes } => {
                    log::debug!("Peer document received ({} records)", shapes.len());
                    canvas.replace_from_remote(shapes);
                    replaced = true;
                }
                SyncEvent::PeerJoined { peer_id } => {
                    self.peers += 1;
                    log::info!("Peer {peer_id} joined board {}", self.board);
                }
                SyncEvent::PeerLeft { peer_id } => {
                    self.peers = self.peers.saturating_sub(1);
                    log::info!("Peer {peer_id} left board {}", self.board);
                }
                SyncEvent::Disconnected => {
                    log::info!("Live sync disconnected");
                    self.peers = 0;
                }
                SyncEvent::Error { message } => {
                    log::warn!("Live sync error: {message}");
                }
            }
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rectangle, Shape};
    use crate::sync::{ConnectionState, LoopbackTransport, SyncError};
    use kurbo::Point;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Transport whose sent messages stay inspectable after being boxed.
    #[derive(Clone, Default)]
    struct SharedTransport {
        state: Arc<Mutex<ConnectionState>>,
        sent: Arc<Mutex<Vec<String>>>,
        incoming: Arc<Mutex<Vec<SyncEvent>>>,
    }

    impl SyncTransport for SharedTransport {
        fn connect(&mut self, _url: &str) -> SyncResult<()> {
            self.incoming.lock().unwrap().push(SyncEvent::Connected);
            Ok(())
        }

        fn disconnect(&mut self) {
            *self.state.lock().unwrap() = ConnectionState::Disconnected;
        }

        fn send(&self, msg: &str) -> SyncResult<()> {
            if *self.state.lock().unwrap() != ConnectionState::Connected {
                return Err(SyncError::NotConnected);
            }
            self.sent.lock().unwrap().push(msg.to_string());
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            let events = std::mem::take(&mut *self.incoming.lock().unwrap());
            for event in &events {
                if *event == SyncEvent::Connected {
                    *self.state.lock().unwrap() = ConnectionState::Connected;
                }
            }
            events
        }

        fn state(&self) -> ConnectionState {
            *self.state.lock().unwrap()
        }
    }

    fn sent_messages(transport: &SharedTransport) -> Vec<Value> {
        transport
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }

    #[test]
    fn test_connect_pushes_full_document() {
        let transport = SharedTransport::default();
        let mut live = LiveSync::with_transport("board-1", Box::new(transport.clone()));
        let mut canvas = Canvas::default();
        canvas
            .document
            .push(Shape::Rectangle(Rectangle::new(Point::ZERO, Point::new(10.0, 10.0))));

        live.broadcast(canvas.to_records());
        assert!(sent_messages(&transport).is_empty());

        live.connect("ws://localhost/ws/board-1").unwrap();
        assert!(!live.poll(&mut canvas));
        let sent = sent_messages(&transport);
        assert_eq!(sent[0], json!({"type": "join", "board": "board-1"}));
        assert_eq!(sent[1]["type"], "shapes");
        assert_eq!(sent[1]["shapes"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_deferred_push_waits_for_publish() {
        let transport = SharedTransport::default();
        let mut live = LiveSync::with_transport("b", Box::new(transport.clone()));
        live.defer_initial_push();
        let mut canvas = Canvas::default();

        live.connect("ws://localhost/ws/b").unwrap();
        live.poll(&mut canvas);
        let sent = sent_messages(&transport);
        assert_eq!(sent, vec![json!({"type": "join", "board": "b"})]);

        live.publish(vec![json!({"type": "line"})]);
        let sent = sent_messages(&transport);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1]["shapes"].as_array().unwrap().len(), 1);

        // Later reconnects push straight away again.
        transport.incoming.lock().unwrap().push(SyncEvent::Connected);
        live.poll(&mut canvas);
        assert_eq!(sent_messages(&transport).len(), 4);
    }

    #[test]
    fn test_peer_document_replaces_local() {
        let transport = SharedTransport::default();
        let mut live = LiveSync::with_transport("b", Box::new(transport.clone()));
        let mut canvas = Canvas::default();
        canvas
            .document
            .push(Shape::Rectangle(Rectangle::new(Point::ZERO, Point::new(10.0, 10.0))));
        let history_len = canvas.history().len();

        transport.incoming.lock().unwrap().push(SyncEvent::ShapesReceived {
            shapes: vec![
                json!({"type": "line", "startX": 0, "startY": 0, "endX": 1, "endY": 1}),
                json!({"type": "circle", "startX": 0, "startY": 0, "endX": 5, "endY": 5}),
            ],
        });
        assert!(live.poll(&mut canvas));
        assert_eq!(canvas.document.len(), 2);
        assert_eq!(canvas.history().len(), history_len);
        assert!(!canvas.persist_pending());
    }

    #[test]
    fn test_peer_presence() {
        let mut transport = LoopbackTransport::new();
        transport.deliver(SyncEvent::PeerJoined { peer_id: "a".into() });
        transport.deliver(SyncEvent::PeerJoined { peer_id: "b".into() });
        transport.deliver(SyncEvent::PeerLeft { peer_id: "a".into() });
        let mut live = LiveSync::with_transport("b", Box::new(transport));
        let mut canvas = Canvas::default();
        live.poll(&mut canvas);
        assert_eq!(live.peer_count(), 1);
    }
}
