//! Per-board broadcast rooms for live sync.

use dashmap::DashMap;
use inkslate_core::sync::ServerMessage;
use std::collections::HashSet;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// A message tagged with the peer that caused it.
pub type Envelope = (String, ServerMessage);

/// Room state
struct Room {
    tx: broadcast::Sender<Envelope>,
    peers: HashSet<String>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
        }
    }
}

/// Active rooms, one per board with at least one connected peer.
#[derive(Default)]
pub struct Rooms {
    rooms: DashMap<String, Room>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to a board's room and subscribe it to the room's traffic.
    pub fn join(&self, board: &str, peer_id: &str) -> broadcast::Receiver<Envelope> {
        let mut room = self.rooms.entry(board.to_string()).or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        room.tx.subscribe()
    }

    /// Remove a peer; empty rooms are dropped.
    pub fn leave(&self, board: &str, peer_id: &str) {
        let empty = match self.rooms.get_mut(board) {
            Some(mut room) => {
                room.peers.remove(peer_id);
                room.peers.is_empty()
            }
            None => false,
        };
        if empty {
            self.rooms.remove(board);
        }
    }

    pub fn peer_count(&self, board: &str) -> usize {
        self.rooms.get(board).map_or(0, |room| room.peers.len())
    }

    /// Send to every subscriber of the room. Receivers skip their own messages.
    pub fn broadcast(&self, board: &str, from: &str, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(board) {
            let _ = room.tx.send((from.to_string(), msg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_broadcast_reaches_room_members() {
        let rooms = Rooms::new();
        let mut alice = rooms.join("board", "alice");
        let mut bob = rooms.join("board", "bob");
        let mut other = rooms.join("elsewhere", "carol");
        assert_eq!(rooms.peer_count("board"), 2);

        let msg = ServerMessage::Shapes {
            shapes: vec![json!({"type": "line"})],
        };
        rooms.broadcast("board", "alice", msg.clone());
        assert_eq!(bob.recv().await.unwrap(), ("alice".to_string(), msg.clone()));
        // Senders see their own envelope and are expected to skip it.
        assert_eq!(alice.recv().await.unwrap().0, "alice");
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_empty_rooms_are_dropped() {
        let rooms = Rooms::new();
        let _rx = rooms.join("board", "alice");
        rooms.leave("board", "alice");
        assert_eq!(rooms.peer_count("board"), 0);
        assert!(rooms.rooms.is_empty());
        rooms.leave("never-joined", "bob");
    }
}
