use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::modules::utils::time::get_current_timestamp;

/// One persisted session: the bound user id and the fixed expiry stamped
/// at creation. The user id is a lookup key, not ownership — the user
/// record lives in the identity store.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionEntry {
    pub user_id: String,
    pub expires_at: u64,
}

impl SessionEntry {
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Durable mapping from an opaque session token to the owning user id.
///
/// Expiry is evaluated lazily at `get` time; no background sweep is
/// required. `delete` is idempotent.
pub trait SessionStore {
    fn put(&self, token: &str, user_id: &str, expires_at: u64) -> Result<(), StoreError>;
    fn get(&self, token: &str) -> Result<Option<String>, StoreError>;
    fn delete(&self, token: &str) -> Result<(), StoreError>;
}

// Delegation so one store instance can be lent to several consumers
impl<T: SessionStore + ?Sized> SessionStore for &T {
    fn put(&self, token: &str, user_id: &str, expires_at: u64) -> Result<(), StoreError> {
        (**self).put(token, user_id, expires_at)
    }
    fn get(&self, token: &str) -> Result<Option<String>, StoreError> {
        (**self).get(token)
    }
    fn delete(&self, token: &str) -> Result<(), StoreError> {
        (**self).delete(token)
    }
}

/// In-memory session store
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn locked(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionEntry>>, StoreError> {
        self.sessions
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, token: &str, user_id: &str, expires_at: u64) -> Result<(), StoreError> {
        let entry = SessionEntry {
            user_id: user_id.to_string(),
            expires_at,
        };
        self.locked()?.insert(token.to_string(), entry);
        Ok(())
    }

    fn get(&self, token: &str) -> Result<Option<String>, StoreError> {
        let mut sessions = self.locked()?;
        let now = get_current_timestamp();

        match sessions.get(token) {
            Some(entry) if entry.is_expired(now) => {
                // Expired entries are reaped here rather than by a sweeper
                sessions.remove(token);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.user_id.clone())),
            None => Ok(None),
        }
    }

    fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.locked()?.remove(token);
        Ok(())
    }
}
