//! In-memory conversation sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// One question and its answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
    pub at: DateTime<Utc>,
}

/// Keeps the most recent exchanges of each session.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Vec<Exchange>>>,
    counter: AtomicU64,
    max_history: usize,
}

impl SessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
            max_history,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Vec<Exchange>>> {
        // A panic mid-update leaves at worst a truncated history.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new, empty session and return its id.
    pub fn create_session(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("session_{}", n);
        self.sessions().insert(id.clone(), Vec::new());
        debug!("Created {}", id);
        id
    }

    /// Record an exchange, creating the session if it does not exist.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) {
        let mut sessions = self.sessions();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
            at: Utc::now(),
        });
        let excess = history.len().saturating_sub(self.max_history);
        history.drain(..excess);
    }

    /// Rendered history of a session, or `None` when it has none.
    pub fn history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions();
        let history = sessions.get(session_id).filter(|h| !h.is_empty())?;
        Some(
            history
                .iter()
                .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Drop a session and its history.
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self, session_id: &str) {
        if let Some(history) = self.sessions().get_mut(session_id) {
            history.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_sequential() {
        let store = SessionStore::new(2);
        assert_eq!(store.create_session(), "session_1");
        assert_eq!(store.create_session(), "session_2");
    }

    #[test]
    fn test_new_session_has_no_history() {
        let store = SessionStore::new(2);
        let id = store.create_session();
        assert_eq!(store.history(&id), None);
        assert_eq!(store.history("session_99"), None);
    }

    #[test]
    fn test_history_keeps_most_recent_exchanges() {
        let store = SessionStore::new(2);
        let id = store.create_session();
        store.add_exchange(&id, "q1", "a1");
        store.add_exchange(&id, "q2", "a2");
        store.add_exchange(&id, "q3", "a3");

        assert_eq!(
            store.history(&id).as_deref(),
            Some("User: q2\nAssistant: a2\nUser: q3\nAssistant: a3")
        );
    }

    #[test]
    fn test_exchange_creates_unknown_session() {
        let store = SessionStore::new(2);
        store.add_exchange("external", "q", "a");
        assert_eq!(
            store.history("external").as_deref(),
            Some("User: q\nAssistant: a")
        );
    }

    #[test]
    fn test_zero_history_remembers_nothing() {
        let store = SessionStore::new(0);
        let id = store.create_session();
        store.add_exchange(&id, "q", "a");
        assert_eq!(store.history(&id), None);
    }

    #[test]
    fn test_remove_drops_session() {
        let store = SessionStore::new(2);
        let first = store.create_session();
        store.add_exchange(&first, "q", "a");
        let second = store.create_session();

        assert!(store.remove(&first));
        assert!(!store.remove(&first));
        assert_eq!(store.history(&first), None);
        assert_eq!(store.len(), 1);
        assert_eq!(second, "session_2");
    }

    #[test]
    fn test_clear() {
        let store = SessionStore::new(2);
        let id = store.create_session();
        store.add_exchange(&id, "q", "a");
        store.clear(&id);
        assert_eq!(store.history(&id), None);
    }
}
