//! Registry of rooms and per-room fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;

use crate::game::session::{GameSession, PlayerId};
use crate::util::id::new_room_id;
use crate::ws::protocol::ServerToClient;

/// One game room: the session state plus the outbound channel of every
/// connected member. The two are locked separately so game logic stays
/// testable without any sockets attached.
pub struct Room {
    pub id: String,
    game: Mutex<GameSession>,
    conns: Mutex<HashMap<PlayerId, UnboundedSender<ServerToClient>>>,
}

impl Room {
    pub fn game(&self) -> MutexGuard<'_, GameSession> {
        self.game.lock()
    }

    pub fn attach(&self, id: PlayerId, tx: UnboundedSender<ServerToClient>) {
        self.conns.lock().insert(id, tx);
    }

    pub fn detach(&self, id: PlayerId) {
        self.conns.lock().remove(&id);
    }

    /// Send to every member of the room.
    pub fn broadcast(&self, msg: &ServerToClient) {
        for tx in self.conns.lock().values() {
            let _ = tx.send(msg.clone());
        }
    }

    /// Send to every member except `skip` (e.g. the acting player, who
    /// gets a richer private message instead).
    pub fn broadcast_except(&self, skip: PlayerId, msg: &ServerToClient) {
        for (id, tx) in self.conns.lock().iter() {
            if *id != skip {
                let _ = tx.send(msg.clone());
            }
        }
    }

    /// Send to a single member, dropping the message if they are gone.
    pub fn send_to(&self, id: PlayerId, msg: &ServerToClient) {
        if let Some(tx) = self.conns.lock().get(&id) {
            let _ = tx.send(msg.clone());
        }
    }
}

/// Owned store of room-id → room, injected into the dispatcher.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Insert a fresh room around `game` under a new short id. Ids are
    /// random base36 and not globally unique; retry instead of clobbering
    /// an existing room on the rare collision.
    pub fn create(&self, game: GameSession) -> Arc<Room> {
        let id = loop {
            let candidate = new_room_id();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let room = Arc::new(Room {
            id: id.clone(),
            game: Mutex::new(game),
            conns: Mutex::new(HashMap::new()),
        });
        self.rooms.insert(id, room.clone());
        room
    }

    pub fn get(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|r| r.clone())
    }

    pub fn remove(&self, id: &str) {
        self.rooms.remove(id);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn create_get_remove_roundtrip() {
        let registry = RoomRegistry::new();
        let host = Ulid::new();
        let room = registry.create(GameSession::new(host));

        assert_eq!(room.id.len(), 6);
        let found = registry.get(&room.id).expect("room is registered");
        assert!(Arc::ptr_eq(&room, &found));

        registry.remove(&room.id);
        assert!(registry.get(&room.id).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn detached_members_stop_receiving() {
        let registry = RoomRegistry::new();
        let host = Ulid::new();
        let room = registry.create(GameSession::new(host));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        room.attach(host, tx);
        room.broadcast(&ServerToClient::Error {
            message: "ping".into(),
        });
        assert!(rx.try_recv().is_ok());

        room.detach(host);
        room.broadcast(&ServerToClient::Error {
            message: "ping".into(),
        });
        assert!(rx.try_recv().is_err());
    }
}
