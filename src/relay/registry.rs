//! Live connection registry.
//!
//! Maps each open connection to its declared language and its outbound
//! channel. The lock is only ever held to mutate the map or copy a snapshot
//! out of it; nothing awaits while holding it.

use crate::i18n::LanguageTag;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;

/// Identity of one connection. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SendError {
    #[error("Connection {0} is closed")]
    ChannelClosed(ConnectionId),
}

/// A frame queued for a connection's socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Sending half of a connection's channel.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    /// Create a handle plus the receiver the socket writer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send_text(&self, id: ConnectionId, text: String) -> Result<(), SendError> {
        self.tx
            .send(Outbound::Text(text))
            .map_err(|_| SendError::ChannelClosed(id))
    }

    pub fn send_error(&self, id: ConnectionId, reason: &str) -> Result<(), SendError> {
        self.send_text(id, format_error_line(reason))
    }

    /// Ask the writer to close the socket. Closing twice is harmless.
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

/// Line delivered in place of a translation that failed.
pub fn format_error_line(reason: &str) -> String {
    format!("[Error] {}", reason)
}

#[derive(Debug, Clone)]
struct Connection {
    language: LanguageTag,
    handle: ConnectionHandle,
    connected_at: DateTime<Utc>,
}

/// One entry of a point-in-time registry snapshot.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: ConnectionId,
    pub language: LanguageTag,
    pub handle: ConnectionHandle,
}

/// Summary of a connection, reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub language: LanguageTag,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh identity for a connection about to be registered.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Record an open connection. Registering an id again overwrites its tag.
    pub fn register(&self, id: ConnectionId, language: LanguageTag, handle: ConnectionHandle) {
        let connection = Connection {
            language,
            handle,
            connected_at: Utc::now(),
        };
        self.lock().insert(id, connection);
    }

    /// Remove a connection. Returns whether it was present.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn language_of(&self, id: ConnectionId) -> Option<LanguageTag> {
        self.lock().get(&id).map(|c| c.language.clone())
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy out every connection except `excluded`. Order is unspecified.
    pub fn snapshot_except(&self, excluded: ConnectionId) -> Vec<Recipient> {
        self.lock()
            .iter()
            .filter(|(id, _)| **id != excluded)
            .map(|(id, c)| Recipient {
                id: *id,
                language: c.language.clone(),
                handle: c.handle.clone(),
            })
            .collect()
    }

    /// Remove every connection, returning them for closing.
    pub fn drain(&self) -> Vec<Recipient> {
        self.lock()
            .drain()
            .map(|(id, c)| Recipient {
                id,
                language: c.language,
                handle: c.handle,
            })
            .collect()
    }

    /// Every open connection, oldest first.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<ConnectionInfo> = self
            .lock()
            .iter()
            .map(|(id, c)| ConnectionInfo {
                id: *id,
                language: c.language.clone(),
                connected_at: c.connected_at,
            })
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    // Every critical section is a single map operation, so a poisoned map is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Connection>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
