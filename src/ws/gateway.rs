//! Outbound message fanout
//!
//! The simulation core emits through the `Gateway` trait only; it never sees
//! the transport library. `WsGateway` implements the trait over
//! per-connection channels drained by each socket's writer task.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::protocol::ServerMsg;

/// Capability interface the simulation emits through
pub trait Gateway: Send + Sync {
    /// Deliver to a single connection
    fn emit_to_connection(&self, conn: Uuid, msg: ServerMsg);
    /// Deliver to every connection in a room
    fn emit_to_room(&self, room_id: &str, msg: ServerMsg);
    /// Deliver to every connection on the server
    fn emit_broadcast(&self, msg: ServerMsg);
    /// Connections currently associated with a room
    fn connections_in(&self, room_id: &str) -> Vec<Uuid>;
}

/// Channel-backed gateway used by the real server
pub struct WsGateway {
    /// Writer channel per connection
    senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMsg>>,
    /// Room membership
    rooms: DashMap<String, HashSet<Uuid>>,
    /// Reverse index: connection -> room
    member_of: DashMap<Uuid, String>,
}

impl WsGateway {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
            rooms: DashMap::new(),
            member_of: DashMap::new(),
        }
    }

    /// Register a connection; the returned receiver feeds the socket writer
    pub fn register(&self, conn: Uuid) -> mpsc::UnboundedReceiver<ServerMsg> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(conn, tx);
        rx
    }

    /// Drop a connection and its room membership
    pub fn unregister(&self, conn: Uuid) {
        self.senders.remove(&conn);
        if let Some((_, room_id)) = self.member_of.remove(&conn) {
            if let Some(mut members) = self.rooms.get_mut(&room_id) {
                members.remove(&conn);
            }
        }
    }

    /// Associate a connection with a room (idempotent; a connection belongs
    /// to at most one room)
    pub fn join_room(&self, conn: Uuid, room_id: &str) {
        if let Some(previous) = self.member_of.insert(conn, room_id.to_string()) {
            if previous != room_id {
                if let Some(mut members) = self.rooms.get_mut(&previous) {
                    members.remove(&conn);
                }
            }
        }
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(conn);
    }

    /// The room a connection has joined, if any
    pub fn room_of(&self, conn: Uuid) -> Option<String> {
        self.member_of.get(&conn).map(|r| r.value().clone())
    }

    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }
}

impl Default for WsGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway for WsGateway {
    fn emit_to_connection(&self, conn: Uuid, msg: ServerMsg) {
        if let Some(tx) = self.senders.get(&conn) {
            if tx.send(msg).is_err() {
                debug!(conn = %conn, "Writer channel closed, dropping message");
            }
        }
    }

    fn emit_to_room(&self, room_id: &str, msg: ServerMsg) {
        if let Some(members) = self.rooms.get(room_id) {
            for conn in members.iter() {
                self.emit_to_connection(*conn, msg.clone());
            }
        }
    }

    fn emit_broadcast(&self, msg: ServerMsg) {
        for entry in self.senders.iter() {
            let _ = entry.value().send(msg.clone());
        }
    }

    fn connections_in(&self, room_id: &str) -> Vec<Uuid> {
        self.rooms
            .get(room_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Where a recorded emission was addressed
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Target {
        Connection(Uuid),
        Room(String),
        Broadcast,
    }

    /// Test double capturing every emission for assertions
    #[derive(Default)]
    pub struct RecordingGateway {
        pub emitted: Mutex<Vec<(Target, ServerMsg)>>,
    }

    impl RecordingGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn take(&self) -> Vec<(Target, ServerMsg)> {
            std::mem::take(&mut *self.emitted.lock())
        }

        pub fn count_matching(&self, pred: impl Fn(&ServerMsg) -> bool) -> usize {
            self.emitted
                .lock()
                .iter()
                .filter(|(_, msg)| pred(msg))
                .count()
        }
    }

    impl Gateway for RecordingGateway {
        fn emit_to_connection(&self, conn: Uuid, msg: ServerMsg) {
            self.emitted.lock().push((Target::Connection(conn), msg));
        }

        fn emit_to_room(&self, room_id: &str, msg: ServerMsg) {
            self.emitted
                .lock()
                .push((Target::Room(room_id.to_string()), msg));
        }

        fn emit_broadcast(&self, msg: ServerMsg) {
            self.emitted.lock().push((Target::Broadcast, msg));
        }

        fn connections_in(&self, _room_id: &str) -> Vec<Uuid> {
            Vec::new()
        }
    }

    #[test]
    fn join_room_moves_membership() {
        let gateway = WsGateway::new();
        let conn = Uuid::new_v4();
        let _rx = gateway.register(conn);

        gateway.join_room(conn, "alpha");
        assert_eq!(gateway.connections_in("alpha"), vec![conn]);

        gateway.join_room(conn, "beta");
        assert!(gateway.connections_in("alpha").is_empty());
        assert_eq!(gateway.connections_in("beta"), vec![conn]);
        assert_eq!(gateway.room_of(conn).as_deref(), Some("beta"));
    }

    #[test]
    fn emitted_messages_reach_the_writer_channel() {
        tokio_test::block_on(async {
            let gateway = WsGateway::new();
            let conn = Uuid::new_v4();
            let mut rx = gateway.register(conn);

            gateway.emit_to_connection(conn, ServerMsg::Pong { t: 7 });

            let msg = rx.recv().await.expect("message delivered");
            assert!(matches!(msg, ServerMsg::Pong { t: 7 }));
        });
    }

    #[test]
    fn unregister_clears_membership() {
        let gateway = WsGateway::new();
        let conn = Uuid::new_v4();
        let _rx = gateway.register(conn);
        gateway.join_room(conn, "alpha");

        gateway.unregister(conn);
        assert!(gateway.connections_in("alpha").is_empty());
        assert_eq!(gateway.connection_count(), 0);
    }
}
