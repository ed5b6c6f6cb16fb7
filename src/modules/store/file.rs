use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::warn;
use serde::{Deserialize, Serialize};

use super::identity::{materialize_user, IdentityStore, NewUser, Role, User};
use super::session::{SessionEntry, SessionStore};
use super::StoreError;
use crate::modules::encryption::{open_sealed, seal_data};
use crate::modules::utils::time::get_current_timestamp;

/// Serialized shape of everything the file store persists
#[derive(Serialize, Deserialize, Default)]
struct FileState {
    users: HashMap<String, User>,
    sessions: HashMap<String, SessionEntry>,
}

/// Identity and session store backed by a single encrypted file.
///
/// The on-disk layout is a 16-byte IV followed by the AES-256-CBC
/// ciphertext of the JSON state. Every mutation rewrites the file; reads
/// work from the in-memory copy loaded at open time. An unreadable or
/// undecryptable file is treated as empty rather than fatal, so a fresh
/// deployment starts from nothing.
pub struct FileStore {
    path: PathBuf,
    master_key: Vec<u8>,
    state: Mutex<FileState>,
}

impl FileStore {
    /// Open the store at `path`, decrypting with `master_key`
    pub fn open(path: impl AsRef<Path>, master_key: Vec<u8>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match Self::load_state(&path, &master_key) {
            Ok(state) => state,
            Err(e) => {
                warn!("Account store at {:?} unreadable ({}); starting empty", path, e);
                FileState::default()
            }
        };
        Ok(Self {
            path,
            master_key,
            state: Mutex::new(state),
        })
    }

    fn load_state(path: &Path, master_key: &[u8]) -> io::Result<FileState> {
        if !path.exists() {
            return Ok(FileState::default());
        }
        let sealed = fs::read(path)?;
        let plaintext = open_sealed(&sealed, master_key)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }

    fn persist(&self, state: &FileState) -> Result<(), StoreError> {
        let json = serde_json::to_vec(state)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let sealed = seal_data(&json, &self.master_key)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Write to a sibling temp file and rename over the target, so a
        // crash mid-write never leaves a truncated store behind
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, sealed).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, FileState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Expiry timestamp of a live session, for status display
    pub fn session_expires_at(&self, token: &str) -> Result<Option<u64>, StoreError> {
        let state = self.locked()?;
        let now = get_current_timestamp();
        Ok(state
            .sessions
            .get(token)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.expires_at))
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

impl IdentityStore for FileStore {
    fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.locked()?.users.get(id).cloned())
    }

    fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let wanted = normalize(email);
        Ok(self
            .locked()?
            .users
            .values()
            .find(|user| normalize(&user.email) == wanted)
            .cloned())
    }

    fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let wanted = normalize(username);
        Ok(self
            .locked()?
            .users
            .values()
            .find(|user| normalize(&user.username) == wanted)
            .cloned())
    }

    fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut state = self.locked()?;

        let email = normalize(&new_user.email);
        if state.users.values().any(|user| normalize(&user.email) == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let username = normalize(&new_user.username);
        if state
            .users
            .values()
            .any(|user| normalize(&user.username) == username)
        {
            return Err(StoreError::DuplicateUsername);
        }

        let user = materialize_user(new_user);
        state.users.insert(user.id.clone(), user.clone());
        self.persist(&state)?;
        Ok(user)
    }

    fn set_access(&self, id: &str, has_access: bool) -> Result<User, StoreError> {
        let mut state = self.locked()?;
        let user = state.users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.has_access = has_access;
        user.updated_at = get_current_timestamp();
        let updated = user.clone();
        self.persist(&state)?;
        Ok(updated)
    }

    fn set_role(&self, id: &str, role: Role) -> Result<User, StoreError> {
        let mut state = self.locked()?;
        let user = state.users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.role = role;
        user.updated_at = get_current_timestamp();
        let updated = user.clone();
        self.persist(&state)?;
        Ok(updated)
    }

    fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.locked()?.users.values().cloned().collect())
    }
}

impl SessionStore for FileStore {
    fn put(&self, token: &str, user_id: &str, expires_at: u64) -> Result<(), StoreError> {
        let mut state = self.locked()?;
        state.sessions.insert(
            token.to_string(),
            SessionEntry {
                user_id: user_id.to_string(),
                expires_at,
            },
        );
        self.persist(&state)
    }

    fn get(&self, token: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.locked()?;
        let now = get_current_timestamp();

        match state.sessions.get(token) {
            Some(entry) if entry.is_expired(now) => {
                state.sessions.remove(token);
                self.persist(&state)?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.user_id.clone())),
            None => Ok(None),
        }
    }

    fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut state = self.locked()?;
        if state.sessions.remove(token).is_some() {
            self.persist(&state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SESSION_MAX_AGE_SECS;
    use tempfile::tempdir;

    fn test_key() -> Vec<u8> {
        vec![0x42; 32]
    }

    fn sample_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            credential: "deadbeef.cafebabe".to_string(),
            role: Role::User,
            has_access: false,
        }
    }

    #[test]
    fn test_users_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.dat");

        let created = {
            let store = FileStore::open(&path, test_key()).unwrap();
            store.create(sample_user("a@x.com", "alice")).unwrap()
        };

        let reopened = FileStore::open(&path, test_key()).unwrap();
        let loaded = reopened.get_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.credential, "deadbeef.cafebabe");
    }

    #[test]
    fn test_sessions_survive_reopen_and_expire() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.dat");
        let live_expiry = get_current_timestamp() + SESSION_MAX_AGE_SECS;

        {
            let store = FileStore::open(&path, test_key()).unwrap();
            store.put("live", "user-1", live_expiry).unwrap();
            store.put("stale", "user-2", 1).unwrap();
        }

        let reopened = FileStore::open(&path, test_key()).unwrap();
        assert_eq!(reopened.get("live").unwrap(), Some("user-1".to_string()));
        assert_eq!(reopened.get("stale").unwrap(), None);
    }

    #[test]
    fn test_uniqueness_enforced() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("accounts.dat"), test_key()).unwrap();

        store.create(sample_user("a@x.com", "alice")).unwrap();
        assert_eq!(
            store.create(sample_user("A@x.com", "bob")).unwrap_err(),
            StoreError::DuplicateEmail
        );
        assert_eq!(
            store.create(sample_user("b@x.com", "Alice")).unwrap_err(),
            StoreError::DuplicateUsername
        );
    }

    #[test]
    fn test_wrong_key_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.dat");

        {
            let store = FileStore::open(&path, test_key()).unwrap();
            store.create(sample_user("a@x.com", "alice")).unwrap();
        }

        // A different key cannot read the file; the store opens empty
        // instead of failing
        let other = FileStore::open(&path, vec![0x43; 32]).unwrap();
        assert!(other.get_by_email("a@x.com").unwrap().is_none());
    }

    #[test]
    fn test_persist_renames_over_target_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.dat");

        // A leftover temp file from an interrupted earlier write must not
        // disturb anything
        std::fs::write(dir.path().join("accounts.tmp"), b"half a ciphertext").unwrap();

        let store = FileStore::open(&path, test_key()).unwrap();
        store.create(sample_user("a@x.com", "alice")).unwrap();

        // The write landed at the target and no temp file remains
        assert!(path.exists());
        assert!(!dir.path().join("accounts.tmp").exists());

        let reopened = FileStore::open(&path, test_key()).unwrap();
        assert!(reopened.get_by_email("a@x.com").unwrap().is_some());
    }

    #[test]
    fn test_session_expires_at() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("accounts.dat"), test_key()).unwrap();
        let expiry = get_current_timestamp() + SESSION_MAX_AGE_SECS;

        store.put("live", "user-1", expiry).unwrap();
        store.put("stale", "user-2", 1).unwrap();

        assert_eq!(store.session_expires_at("live").unwrap(), Some(expiry));
        assert_eq!(store.session_expires_at("stale").unwrap(), None);
        assert_eq!(store.session_expires_at("missing").unwrap(), None);
    }

    #[test]
    fn test_access_updates_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.dat");

        let id = {
            let store = FileStore::open(&path, test_key()).unwrap();
            let user = store.create(sample_user("a@x.com", "alice")).unwrap();
            store.set_access(&user.id, true).unwrap();
            store.set_role(&user.id, Role::Admin).unwrap();
            user.id
        };

        let reopened = FileStore::open(&path, test_key()).unwrap();
        let user = reopened.get_by_id(&id).unwrap().unwrap();
        assert!(user.has_access);
        assert!(user.role.is_admin());
        assert!(user.updated_at >= user.created_at);
    }
}
