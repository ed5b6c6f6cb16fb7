pub mod access;

// Re-export the main types and functions
pub use access::{grant_access, list_users, revoke_access, set_user_role};
