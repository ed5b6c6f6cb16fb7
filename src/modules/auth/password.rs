use std::io;

/// Ways a candidate password can fall short of the strength policy
#[derive(Debug)]
pub enum PasswordError {
    TooShort,
    NoUppercase,
    NoLowercase,
    NoNumber,
    NoSpecialChar,
}

/// Function to validate password strength.
///
/// The authentication core itself only requires a non-empty password; this
/// policy is layered on top by the registration front end.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.len() < 8 {
        return Err(PasswordError::TooShort);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordError::NoUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(PasswordError::NoLowercase);
    }
    if !password.chars().any(|c| c.is_numeric()) {
        return Err(PasswordError::NoNumber);
    }
    if !password
        .chars()
        .any(|c| "!@#$%^&*()_+-=[]{}|;:,.<>?".contains(c))
    {
        return Err(PasswordError::NoSpecialChar);
    }
    Ok(())
}

/// Human-readable description of a strength failure, for the CLI
pub fn describe_password_error(err: &PasswordError) -> &'static str {
    match err {
        PasswordError::TooShort => "password must be at least 8 characters",
        PasswordError::NoUppercase => "password needs an uppercase letter",
        PasswordError::NoLowercase => "password needs a lowercase letter",
        PasswordError::NoNumber => "password needs a digit",
        PasswordError::NoSpecialChar => "password needs a special character",
    }
}

/// Helper function to read a password securely
pub fn read_password() -> io::Result<String> {
    rpassword::read_password()
}
