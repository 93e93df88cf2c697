use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::snowflake;

pub type SessionId = String;

/// A connected gateway session. Owned exclusively by the registry; the
/// socket task holds the receiving end of `tx`.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub connected_at: DateTime<Utc>,
    /// Highest sequence enqueued to this session. Monotonically
    /// non-decreasing for the life of the session.
    pub cursor: u64,
    pub tx: mpsc::Sender<String>,
}

/// Tracks live sessions and their delivery queues.
///
/// Removing a session drops the registry's sender clone; once every
/// in-flight clone is gone the socket task's receiver closes and the
/// connection tears down. In-flight sends to a removed session are
/// best-effort and may be silently dropped.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Create a session around a delivery queue. The cursor starts at the
    /// current head: new sessions receive no pre-existing backlog unless
    /// they explicitly request replay.
    pub fn register(&self, tx: mpsc::Sender<String>, head: u64) -> SessionId {
        let id = snowflake::generate();
        self.sessions.insert(
            id.clone(),
            Session {
                id: id.clone(),
                connected_at: Utc::now(),
                cursor: head,
                tx,
            },
        );
        id
    }

    /// Remove a session. Idempotent; returns whether it was present.
    pub fn unregister(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn sender_for(&self, id: &str) -> Option<mpsc::Sender<String>> {
        self.sessions.get(id).map(|s| s.tx.clone())
    }

    /// A point-in-time list of live sessions and their delivery queues.
    /// Sessions added or removed afterwards do not affect the returned set.
    pub fn snapshot(&self) -> Vec<(SessionId, mpsc::Sender<String>)> {
        self.sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().tx.clone()))
            .collect()
    }

    /// Raise a session's delivery cursor. Never moves it backwards.
    pub fn advance_cursor(&self, id: &str, sequence: u64) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            if sequence > session.cursor {
                session.cursor = sequence;
            }
        }
    }

    pub fn cursor_of(&self, id: &str) -> Option<u64> {
        self.sessions.get(id).map(|s| s.cursor)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
