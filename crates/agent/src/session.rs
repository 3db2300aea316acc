use std::collections::HashMap;
use std::sync::Mutex;

use redress_core::domain::{Role, Turn};
use uuid::Uuid;

/// Transcript bound per session: 5 user + 5 assistant turns. Keeps prompt
/// size flat no matter how long a customer keeps a session alive.
pub const MAX_HISTORY_TURNS: usize = 10;

/// Returns the supplied session id unchanged (client ids are trusted, no
/// existence check), or generates a fresh UUID when absent or empty.
pub fn get_or_create_session(session_id: Option<&str>) -> String {
    match session_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Keyed transcript store with bounded-size-per-key semantics and no TTL.
///
/// Kept behind a trait so the in-memory map can be swapped for a persistent
/// backend without touching the decision engine.
pub trait SessionStore: Send + Sync {
    /// Stored transcript, oldest turn first; empty for unknown sessions.
    fn history(&self, session_id: &str) -> Vec<Turn>;

    /// Appends one turn, pruning the transcript to the most recent
    /// `MAX_HISTORY_TURNS` (oldest dropped first).
    fn append(&self, session_id: &str, role: Role, content: &str);
}

/// Process-lifetime store. The single mutex serializes read-then-append per
/// call, so concurrent appends cannot lose turns; a restart loses all
/// sessions by design.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Vec<Turn>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn history(&self, session_id: &str) -> Vec<Turn> {
        match self.sessions.lock() {
            Ok(sessions) => sessions.get(session_id).cloned().unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn append(&self, session_id: &str, role: Role, content: &str) {
        let Ok(mut sessions) = self.sessions.lock() else {
            return;
        };
        let transcript = sessions.entry(session_id.to_string()).or_default();
        transcript.push(Turn { role, content: content.to_string() });
        if transcript.len() > MAX_HISTORY_TURNS {
            let excess = transcript.len() - MAX_HISTORY_TURNS;
            transcript.drain(..excess);
        }
    }
}
