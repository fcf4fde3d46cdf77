//! In-memory chat sessions for the web server.
//!
//! Sessions expire after an idle TTL. Expired entries are pruned whenever a
//! session is checked out, so the map never needs a background sweeper.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::services::ChatSession;

/// A session with its last-use time.
struct SessionEntry {
    session: Arc<Mutex<ChatSession>>,
    last_used: Instant,
}

impl SessionEntry {
    fn new(session: ChatSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_used: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_used.elapsed() >= ttl
    }
}

/// Chat sessions keyed by id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    persona: String,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(persona: impl Into<String>, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            persona: persona.into(),
            ttl,
        }
    }

    /// Get a session by id, creating it if unknown or expired.
    ///
    /// Without an id a fresh one is generated. Returns the id in use and the
    /// session handle; the handle's mutex serialises turns within a session.
    pub fn checkout(&self, id: Option<&str>) -> (String, Arc<Mutex<ChatSession>>) {
        let id = id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut guard = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let ttl = self.ttl;
        guard.retain(|_, entry| !entry.is_expired(ttl));

        let entry = guard
            .entry(id.clone())
            .or_insert_with(|| SessionEntry::new(ChatSession::new(self.persona.clone())));
        entry.last_used = Instant::now();

        (id, entry.session.clone())
    }

    /// Look up a live session without creating one.
    pub fn get(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().ok().and_then(|guard| {
            guard
                .get(id)
                .filter(|entry| !entry.is_expired(self.ttl))
                .map(|entry| entry.session.clone())
        })
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions
            .write()
            .map(|mut guard| guard.remove(id).is_some())
            .unwrap_or(false)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .map(|guard| guard.values().filter(|e| !e.is_expired(self.ttl)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_creates_and_reuses() {
        let store = SessionStore::new("persona", Duration::from_secs(60));
        let (id, first) = store.checkout(None);
        assert!(!id.is_empty());

        let (same_id, second) = store.checkout(Some(&id));
        assert_eq!(id, same_id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_client_chosen_id_is_kept() {
        let store = SessionStore::new("persona", Duration::from_secs(60));
        let (id, _) = store.checkout(Some("browser-tab-1"));
        assert_eq!(id, "browser-tab-1");
        assert!(store.get("browser-tab-1").is_some());
        assert!(store.get("other").is_none());
    }

    #[test]
    fn test_expired_sessions_are_pruned() {
        let store = SessionStore::new("persona", Duration::ZERO);
        let (id, _) = store.checkout(None);
        assert!(store.get(&id).is_none());
        assert_eq!(store.len(), 0);

        store.checkout(None);
        assert_eq!(store.sessions.read().unwrap().len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new("persona", Duration::from_secs(60));
        let (id, _) = store.checkout(None);
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }
}
