use log::info;

use crate::modules::store::identity::{IdentityStore, Role, User};
use crate::modules::store::StoreError;

/// Operator-side account management.
///
/// These operations write through the identity store directly, outside
/// the authentication lifecycle. Because `current_identity` re-fetches
/// the user on every call, a change made here is visible to the affected
/// user's existing sessions on their very next request — no re-login.

fn find_by_username<S: IdentityStore>(store: &S, username: &str) -> Result<User, StoreError> {
    store.get_by_username(username)?.ok_or(StoreError::NotFound)
}

/// Grant a user access to the paid content
pub fn grant_access<S: IdentityStore>(store: &S, username: &str) -> Result<User, StoreError> {
    let user = find_by_username(store, username)?;
    let updated = store.set_access(&user.id, true)?;
    info!("Access granted for user id {}", updated.id);
    Ok(updated)
}

/// Revoke a user's access to the paid content
pub fn revoke_access<S: IdentityStore>(store: &S, username: &str) -> Result<User, StoreError> {
    let user = find_by_username(store, username)?;
    let updated = store.set_access(&user.id, false)?;
    info!("Access revoked for user id {}", updated.id);
    Ok(updated)
}

/// Change a user's role
pub fn set_user_role<S: IdentityStore>(
    store: &S,
    username: &str,
    role: Role,
) -> Result<User, StoreError> {
    let user = find_by_username(store, username)?;
    let updated = store.set_role(&user.id, role)?;
    info!("Role changed to {:?} for user id {}", role, updated.id);
    Ok(updated)
}

/// All user accounts, for the operator listing
pub fn list_users<S: IdentityStore>(store: &S) -> Result<Vec<User>, StoreError> {
    store.list()
}
