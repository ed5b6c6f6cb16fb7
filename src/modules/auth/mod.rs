pub mod error;
pub mod hasher;
pub mod password;
pub mod service;
pub mod session;

// Re-export the main types and functions
pub use error::AuthError;
pub use hasher::{hash_password, verify_password, CredentialRecord};
pub use password::{validate_password, PasswordError};
pub use service::{AuthService, AuthSession, Principal};
pub use session::generate_session_token;
