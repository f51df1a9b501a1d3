//! Error types for authentication operations

/// Errors that can occur while preparing authentication material
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Username and/or password missing
    #[error("Username and/or password are empty")]
    MissingCredentials,

    /// A one-time code is needed but no secret is configured
    #[error("OTP secret is empty, can't refresh API key")]
    MissingOtpSecret,

    /// OTP secret is not valid base32
    #[error("Invalid OTP secret: {0}")]
    InvalidOtpSecret(String),

    /// Remember mode outside the accepted set
    #[error("Unknown remember value: {0:?}")]
    UnknownRememberMode(String),

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// System clock is before the Unix epoch
    #[error("System clock error: time went backwards")]
    SystemClock,
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::EnvVarNotSet("NOBITEX_USERNAME".to_string());
        assert!(err.to_string().contains("NOBITEX_USERNAME"));

        let err = AuthError::UnknownRememberMode("maybe".to_string());
        assert!(err.to_string().contains("maybe"));
    }
}
