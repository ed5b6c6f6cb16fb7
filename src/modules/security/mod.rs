pub mod keyring;

// Re-export the main types and functions
pub use keyring::{SecureMasterKey, SessionTokenSlot};
