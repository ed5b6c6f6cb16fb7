use std::error::Error;
use std::fmt;

use crate::modules::store::StoreError;

/// Failure taxonomy of the authentication service
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// An account with this email already exists
    DuplicateEmail,
    /// This username is already taken
    DuplicateUsername,
    /// Unknown email or wrong password; the caller is never told which
    InvalidCredentials,
    /// No valid session for the presented token
    Unauthenticated,
    /// A required field was empty after trimming; carries the field name
    Validation(&'static str),
    /// A backing store was unreachable or failed mid-call
    StoreUnavailable(String),
    /// Anything unanticipated
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::DuplicateEmail => {
                write!(f, "An account with this email already exists")
            }
            AuthError::DuplicateUsername => {
                write!(f, "This username is already taken")
            }
            // One generic message for every credential failure so callers
            // cannot distinguish unknown-email from wrong-password
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::Unauthenticated => write!(f, "Not authenticated"),
            AuthError::Validation(field) => {
                write!(f, "Field '{}' must not be empty", field)
            }
            AuthError::StoreUnavailable(detail) => {
                write!(f, "Storage unavailable: {}", detail)
            }
            AuthError::Internal(detail) => write!(f, "Internal error: {}", detail),
        }
    }
}

impl Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::DuplicateUsername => AuthError::DuplicateUsername,
            StoreError::Unavailable(detail) => AuthError::StoreUnavailable(detail),
            // A NotFound escaping a store call the service expected to
            // succeed is not a domain outcome
            StoreError::NotFound => AuthError::Internal("record vanished mid-operation".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        let message = AuthError::InvalidCredentials.to_string();
        assert!(!message.to_lowercase().contains("email"));
        assert!(!message.to_lowercase().contains("password"));
        assert!(!message.to_lowercase().contains("user"));
    }

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(AuthError::from(StoreError::DuplicateEmail), AuthError::DuplicateEmail);
        assert_eq!(
            AuthError::from(StoreError::DuplicateUsername),
            AuthError::DuplicateUsername
        );
        assert!(matches!(
            AuthError::from(StoreError::Unavailable("down".to_string())),
            AuthError::StoreUnavailable(_)
        ));
        assert!(matches!(AuthError::from(StoreError::NotFound), AuthError::Internal(_)));
    }
}
