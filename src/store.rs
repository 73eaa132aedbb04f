//! In-memory session persistence

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::{Session, SessionStatus, SessionStore};
use crate::{Error, Result};

/// In-memory session store. Safe for concurrent access: reads share the
/// lock, saves and deletes take it exclusively.
///
/// Also owns the per-session mutex registry used by the engine and the
/// timer supervisor to serialize load -> mutate -> save sequences.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    /// Create an empty in-memory session store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().expect("session store poisoned");
        tracing::debug!(
            session = %session.id,
            recipe = %session.recipe_id,
            status = %session.status,
            "saving session"
        );
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Session> {
        let sessions = self.sessions.read().expect("session store poisoned");
        sessions.get(id).cloned().ok_or_else(|| {
            tracing::debug!(session = %id, "session not found");
            Error::NotFound(format!("session {id}"))
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().expect("session store poisoned");
        if sessions.remove(id).is_none() {
            return Err(Error::NotFound(format!("session {id}")));
        }
        tracing::debug!(session = %id, "deleted session");
        Ok(())
    }

    fn list_active(&self) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().expect("session store poisoned");
        let out: Vec<Session> = sessions
            .values()
            .filter(|s| matches!(s.status, SessionStatus::Active | SessionStatus::Paused))
            .cloned()
            .collect();
        tracing::debug!(count = out.len(), "listing active sessions");
        Ok(out)
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        Arc::clone(
            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}
