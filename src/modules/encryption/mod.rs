pub mod crypto;

// Re-export the main types and functions
pub use crypto::{open_sealed, seal_data};
