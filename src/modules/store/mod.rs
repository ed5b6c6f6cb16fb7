pub mod file;
pub mod identity;
pub mod session;

// Re-export the main types and functions
pub use file::FileStore;
pub use identity::{IdentityStore, MemoryIdentityStore, NewUser, Role, User};
pub use session::{MemorySessionStore, SessionStore};

use std::error::Error;
use std::fmt;

/// Failures surfaced by the backing stores
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Uniqueness violation on email, detected atomically at create time
    DuplicateEmail,
    /// Uniqueness violation on username, detected atomically at create time
    DuplicateUsername,
    /// The referenced record does not exist
    NotFound,
    /// The store could not be reached or failed mid-call
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateEmail => write!(f, "email already registered"),
            StoreError::DuplicateUsername => write!(f, "username already registered"),
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::Unavailable(detail) => write!(f, "store unavailable: {}", detail),
        }
    }
}

impl Error for StoreError {}
