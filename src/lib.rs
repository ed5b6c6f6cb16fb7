// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{
    admin,
    auth,
    encryption,
    security,
    store,
    utils,
};

// Re-export commonly used types
pub use modules::auth::error::AuthError;
pub use modules::auth::hasher::CredentialRecord;
pub use modules::auth::service::{AuthService, AuthSession, Principal};
pub use modules::store::identity::{IdentityStore, Role, User};
pub use modules::store::session::SessionStore;

// Constants
pub const ACCOUNTS_FILE: &str = "accounts.dat";
pub const CREDENTIAL_KEY_LENGTH: usize = 64;
pub const CREDENTIAL_SALT_LENGTH: usize = 16;
pub const PBKDF2_ITERATIONS: u32 = 100_000;
pub const SESSION_MAX_AGE_SECS: u64 = 24 * 60 * 60;

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
