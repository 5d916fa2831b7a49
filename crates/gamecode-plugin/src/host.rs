//! Host collaborators: the connection and worker the plugin runs inside.
//!
//! The session protocol stack, room registry and room creation are owned by
//! the host server. The plugin only sees them through these traits.
//! [`MemoryWorker`] and [`MemoryConnection`] are in-process implementations
//! used for simulation and tests.

use gamecode_core::{ClientInfo, GameCode, GamecodeError, GamecodeResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::info;

/// A client connection as exposed by the host.
pub trait ClientConnection: Send + Sync {
    /// Metadata reported by the client at handshake.
    fn info(&self) -> &ClientInfo;

    /// Disconnect the client, showing it `reason`.
    fn disconnect(&self, reason: &str);
}

/// The host's room registry and room factory.
#[allow(async_fn_in_trait)]
pub trait Worker: Send + Sync {
    /// Room settings chosen by the client at creation time.
    type Settings: Clone + Send + Sync;
    /// Handle to a live room.
    type Room: Send;

    /// Look up a live room by code.
    async fn find_room(&self, code: GameCode) -> Option<Self::Room>;

    /// Create a room under `code` with `settings`.
    async fn create_room(&self, code: GameCode, settings: Self::Settings)
        -> GamecodeResult<Self::Room>;
}

/// A room held by [`MemoryWorker`].
#[derive(Debug)]
pub struct MemoryRoom<S> {
    pub code: GameCode,
    pub settings: S,
}

/// In-memory worker: a map of rooms keyed by code.
pub struct MemoryWorker<S> {
    rooms: RwLock<HashMap<GameCode, Arc<MemoryRoom<S>>>>,
}

impl<S> Default for MemoryWorker<S> {
    fn default() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }
}

impl<S: Clone + Send + Sync> MemoryWorker<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl<S: Clone + Send + Sync> Worker for MemoryWorker<S> {
    type Settings = S;
    type Room = Arc<MemoryRoom<S>>;

    async fn find_room(&self, code: GameCode) -> Option<Self::Room> {
        self.rooms.read().await.get(&code).cloned()
    }

    async fn create_room(&self, code: GameCode, settings: S) -> GamecodeResult<Self::Room> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&code) {
            return Err(GamecodeError::RoomCreation(format!(
                "room {code} already exists"
            )));
        }
        let room = Arc::new(MemoryRoom { code, settings });
        rooms.insert(code, room.clone());
        info!(code = %code, "room created");
        Ok(room)
    }
}

/// In-memory connection that records disconnect reasons.
#[derive(Debug)]
pub struct MemoryConnection {
    info: ClientInfo,
    disconnects: Mutex<Vec<String>>,
}

impl MemoryConnection {
    pub fn new(info: ClientInfo) -> Self {
        Self {
            info,
            disconnects: Mutex::new(Vec::new()),
        }
    }

    /// Every reason this connection was disconnected with, oldest first.
    pub fn disconnects(&self) -> Vec<String> {
        self.disconnects
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// The most recent disconnect reason.
    pub fn last_disconnect(&self) -> Option<String> {
        self.disconnects().pop()
    }
}

impl ClientConnection for MemoryConnection {
    fn info(&self) -> &ClientInfo {
        &self.info
    }

    fn disconnect(&self, reason: &str) {
        let mut disconnects = self
            .disconnects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        disconnects.push(reason.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ClientInfo {
        ClientInfo {
            remote_addr: "192.0.2.1".parse().unwrap(),
            username: "carol".into(),
            client_version: "2021.6.30".into(),
            platform: "Switch".into(),
            language: 1,
            mods: Vec::new(),
        }
    }

    #[tokio::test]
    async fn memory_worker_creates_and_finds_rooms() {
        let worker = MemoryWorker::new();
        let code = GameCode::parse("ABCDEF").unwrap();
        assert!(worker.find_room(code).await.is_none());

        let room = worker.create_room(code, "settings").await.unwrap();
        assert_eq!(room.code, code);
        assert_eq!(worker.find_room(code).await.unwrap().settings, "settings");
        assert_eq!(worker.room_count().await, 1);
    }

    #[tokio::test]
    async fn memory_worker_rejects_duplicate_code() {
        let worker = MemoryWorker::new();
        let code = GameCode::parse("WXYZ").unwrap();
        worker.create_room(code, 1).await.unwrap();
        let err = worker.create_room(code, 2).await.unwrap_err();
        assert!(matches!(err, GamecodeError::RoomCreation(_)));
    }

    #[test]
    fn memory_connection_records_disconnects() {
        let conn = MemoryConnection::new(info());
        assert!(conn.last_disconnect().is_none());
        conn.disconnect("first");
        conn.disconnect("second");
        assert_eq!(conn.disconnects(), vec!["first", "second"]);
        assert_eq!(conn.last_disconnect().as_deref(), Some("second"));
        assert_eq!(conn.info().username, "carol");
    }
}
