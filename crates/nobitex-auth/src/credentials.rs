//! Login credentials for the Nobitex API
//!
//! # Security
//!
//! Password and OTP secret are stored using the `secrecy` crate which:
//! - Zeroizes memory on drop
//! - Prevents accidental logging via Debug impl
//! - Provides explicit access via `expose_secret()`

use secrecy::{ExposeSecret, SecretString};

use crate::error::{AuthError, AuthResult};

/// Username/password pair plus the material needed for one-time codes
///
/// Immutable once constructed. The one-time code itself is not stored here
/// when a secret is present; it is regenerated on every login.
pub struct Credentials {
    username: String,
    password: SecretString,
    otp_secret: Option<SecretString>,
    otp_code: Option<String>,
}

impl Credentials {
    /// Create credentials from a username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            otp_secret: None,
            otp_code: None,
        }
    }

    /// Attach a base32 shared secret used to generate one-time codes
    pub fn with_otp_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.otp_secret = (!secret.is_empty()).then(|| SecretString::from(secret));
        self
    }

    /// Attach a pre-generated one-time code
    ///
    /// Only used when no secret is configured, so it is good for a single login.
    pub fn with_otp_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.otp_code = (!code.is_empty()).then_some(code);
        self
    }

    /// Create credentials from environment variables
    ///
    /// Reads `NOBITEX_USERNAME` and `NOBITEX_PASSWORD`, plus the optional
    /// `NOBITEX_OTP_SECRET` and `NOBITEX_OTP_CODE`.
    pub fn from_env() -> AuthResult<Self> {
        let username = std::env::var("NOBITEX_USERNAME")
            .map_err(|_| AuthError::EnvVarNotSet("NOBITEX_USERNAME".to_string()))?;
        let password = std::env::var("NOBITEX_PASSWORD")
            .map_err(|_| AuthError::EnvVarNotSet("NOBITEX_PASSWORD".to_string()))?;

        let mut credentials = Self::new(username, password);
        if let Ok(secret) = std::env::var("NOBITEX_OTP_SECRET") {
            credentials = credentials.with_otp_secret(secret);
        }
        if let Ok(code) = std::env::var("NOBITEX_OTP_CODE") {
            credentials = credentials.with_otp_code(code);
        }
        Ok(credentials)
    }

    /// Get the username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the password
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Get the OTP secret, if configured
    pub fn otp_secret(&self) -> Option<&SecretString> {
        self.otp_secret.as_ref()
    }

    /// Get the pre-supplied one-time code, if any
    pub fn otp_code(&self) -> Option<&str> {
        self.otp_code.as_deref()
    }

    /// Check whether a login can produce a one-time code
    pub fn can_produce_otp(&self) -> bool {
        self.otp_secret.is_some() || self.otp_code.is_some()
    }

    /// Fail if username or password is empty
    pub fn validate(&self) -> AuthResult<()> {
        if self.username.is_empty() || self.password.expose_secret().is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret().to_string()),
            otp_secret: self
                .otp_secret
                .as_ref()
                .map(|s| SecretString::from(s.expose_secret().to_string())),
            otp_code: self.otp_code.clone(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("otp_secret", &self.otp_secret.as_ref().map(|_| "[REDACTED]"))
            .field("otp_code", &self.otp_code.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::new("me@example.com", "hunter2")
            .with_otp_secret("JBSWY3DPEHPK3PXP")
            .with_otp_code("123456");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("JBSWY3DPEHPK3PXP"));
        assert!(!debug.contains("123456"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        assert!(matches!(
            Credentials::new("", "pw").validate(),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            Credentials::new("user", "").validate(),
            Err(AuthError::MissingCredentials)
        ));
        assert!(Credentials::new("user", "pw").validate().is_ok());
    }

    #[test]
    fn test_empty_otp_inputs_are_ignored() {
        let creds = Credentials::new("user", "pw")
            .with_otp_secret("")
            .with_otp_code("");
        assert!(creds.otp_secret().is_none());
        assert!(creds.otp_code().is_none());
        assert!(!creds.can_produce_otp());
    }

    #[test]
    fn test_clone_keeps_secret_material() {
        let creds = Credentials::new("user", "pw").with_otp_secret("JBSWY3DPEHPK3PXP");
        let cloned = creds.clone();
        assert_eq!(cloned.password(), "pw");
        assert_eq!(
            cloned.otp_secret().map(|s| s.expose_secret().to_string()),
            Some("JBSWY3DPEHPK3PXP".to_string())
        );
    }
}
