use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::modules::utils::time::get_current_timestamp;

/// Role carried by every user account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Represents a single user account as the identity store persists it.
/// `credential` is the serialized credential record, never a plaintext
/// password.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub credential: String,
    pub role: Role,
    pub has_access: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Fields the authentication service supplies when creating an account;
/// the store fills in the id and timestamps
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub credential: String,
    pub role: Role,
    pub has_access: bool,
}

/// Durable user records, looked up by id, email, or username.
///
/// Email and username lookups are case-insensitive. Uniqueness of both is
/// enforced inside `create` under the store's own concurrency control; any
/// pre-checks a caller performs are only a fast path. The authentication
/// service never calls `set_access`/`set_role` — those exist for operator
/// tooling.
pub trait IdentityStore {
    fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;
    fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    fn set_access(&self, id: &str, has_access: bool) -> Result<User, StoreError>;
    fn set_role(&self, id: &str, role: Role) -> Result<User, StoreError>;
    fn list(&self) -> Result<Vec<User>, StoreError>;
}

// Delegation so one store instance can be lent to several consumers
impl<T: IdentityStore + ?Sized> IdentityStore for &T {
    fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        (**self).get_by_id(id)
    }
    fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        (**self).get_by_email(email)
    }
    fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        (**self).get_by_username(username)
    }
    fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        (**self).create(new_user)
    }
    fn set_access(&self, id: &str, has_access: bool) -> Result<User, StoreError> {
        (**self).set_access(id, has_access)
    }
    fn set_role(&self, id: &str, role: Role) -> Result<User, StoreError> {
        (**self).set_role(id, role)
    }
    fn list(&self) -> Result<Vec<User>, StoreError> {
        (**self).list()
    }
}

/// Function to generate a random 128-bit user id, hex-encoded
pub fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..16).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}

/// Normalized form used for uniqueness checks and lookups
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Builds a User from the create-time fields, stamping id and timestamps.
/// Shared by the bundled store implementations.
pub(crate) fn materialize_user(new_user: NewUser) -> User {
    let now = get_current_timestamp();
    User {
        id: generate_user_id(),
        email: new_user.email,
        username: new_user.username,
        credential: new_user.credential,
        role: new_user.role,
        has_access: new_user.has_access,
        created_at: now,
        updated_at: now,
    }
}

/// In-memory identity store keyed by user id
pub struct MemoryIdentityStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, User>>, StoreError> {
        self.users
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.locked()?.get(id).cloned())
    }

    fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let wanted = normalize(email);
        Ok(self
            .locked()?
            .values()
            .find(|user| normalize(&user.email) == wanted)
            .cloned())
    }

    fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let wanted = normalize(username);
        Ok(self
            .locked()?
            .values()
            .find(|user| normalize(&user.username) == wanted)
            .cloned())
    }

    fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.locked()?;

        // Uniqueness is decided here, under the lock, not by the caller's
        // earlier lookups
        let email = normalize(&new_user.email);
        if users.values().any(|user| normalize(&user.email) == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let username = normalize(&new_user.username);
        if users.values().any(|user| normalize(&user.username) == username) {
            return Err(StoreError::DuplicateUsername);
        }

        let user = materialize_user(new_user);
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn set_access(&self, id: &str, has_access: bool) -> Result<User, StoreError> {
        let mut users = self.locked()?;
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.has_access = has_access;
        user.updated_at = get_current_timestamp();
        Ok(user.clone())
    }

    fn set_role(&self, id: &str, role: Role) -> Result<User, StoreError> {
        let mut users = self.locked()?;
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.role = role;
        user.updated_at = get_current_timestamp();
        Ok(user.clone())
    }

    fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.locked()?.values().cloned().collect())
    }
}
