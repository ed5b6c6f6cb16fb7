use chrono::DateTime;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp
pub fn get_current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Function to format a Unix timestamp as a readable UTC date
pub fn format_timestamp(timestamp: u64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Remaining lifetime of a session, as a human readable string
pub fn format_remaining(expires_at: u64) -> String {
    let now = get_current_timestamp();
    if expires_at <= now {
        return "expired".to_string();
    }
    let seconds = expires_at - now;
    if seconds < 60 {
        format!("{} seconds", seconds)
    } else if seconds < 3600 {
        format!("{} minutes", seconds / 60)
    } else {
        format!("{} hours", seconds / 3600)
    }
}
