use env_logger::{Builder, WriteStyle};
use log::{info, warn, LevelFilter};
use std::fs::OpenOptions;

/// Initialize the logging system writing to the application log file
pub fn initialize_logging() -> Result<(), Box<dyn std::error::Error>> {
    // Create or append to log file with proper permissions
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("trade-academy.log")?;

    // Configure the logging system
    Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp_secs()
        .format_module_path(true)
        .write_style(WriteStyle::Auto)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    info!("Logging system initialized");
    Ok(())
}

/// Helper function to mask identifiers before they reach the log.
/// Emails and usernames are personal data; tokens and passwords must never
/// be passed here at all.
fn format_sensitive(text: &str) -> String {
    // Mask by characters, not bytes: identifiers are caller-supplied and a
    // byte slice could land inside a multi-byte character
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Structured logging for authentication events (register, login, logout,
/// whoami)
pub fn log_auth_event(event_type: &str, identifier: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Auth event: type={}, who={}, success=true, timestamp={}, details={:?}",
            event_type,
            format_sensitive(identifier),
            timestamp,
            details
        );
    } else {
        warn!(
            "Auth event: type={}, who={}, success=false, timestamp={}, details={:?}",
            event_type,
            format_sensitive(identifier),
            timestamp,
            details
        );
    }
}
