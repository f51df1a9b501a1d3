//! One-time codes for the login flow
//!
//! Nobitex requires an `X-TOTP` header on login. The code is derived from the
//! account's shared secret and the current time as described in RFC 6238.
//! [`OtpProvider`] is the seam; [`Totp`] is the default implementation.

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use tracing::trace;

use crate::error::{AuthError, AuthResult};

type HmacSha1 = Hmac<Sha1>;

/// Default time step in seconds
pub const DEFAULT_STEP_SECS: u64 = 30;

/// Default number of digits in a code
pub const DEFAULT_DIGITS: u32 = 6;

/// Source of one-time codes
///
/// Implementations must be deterministic for a given secret and instant so
/// test doubles can be swapped in.
pub trait OtpProvider: Send + Sync {
    /// Produce the code valid at `at` for `secret`
    fn generate(&self, secret: &SecretString, at: DateTime<Utc>) -> AuthResult<String>;
}

/// RFC 6238 time-based one-time password generator (HMAC-SHA1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totp {
    step_secs: u64,
    digits: u32,
}

impl Totp {
    /// Create a generator with a custom step and digit count
    pub fn new(step_secs: u64, digits: u32) -> Self {
        Self {
            step_secs: step_secs.max(1),
            digits: digits.clamp(1, 9),
        }
    }

    fn counter(&self, at: DateTime<Utc>) -> AuthResult<u64> {
        let secs = u64::try_from(at.timestamp()).map_err(|_| AuthError::SystemClock)?;
        Ok(secs / self.step_secs)
    }
}

impl Default for Totp {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_SECS, DEFAULT_DIGITS)
    }
}

impl OtpProvider for Totp {
    fn generate(&self, secret: &SecretString, at: DateTime<Utc>) -> AuthResult<String> {
        let key = decode_secret(secret.expose_secret())?;
        let counter = self.counter(at)?;

        let mut mac = HmacSha1::new_from_slice(&key)
            .map_err(|e| AuthError::InvalidOtpSecret(e.to_string()))?;
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        // Dynamic truncation (RFC 4226 section 5.3)
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);
        let code = binary % 10u32.pow(self.digits);
        trace!(counter, "Generated one-time code");

        Ok(format!("{:0width$}", code, width = self.digits as usize))
    }
}

/// Decode a base32 secret as authenticator apps display it
///
/// Spaces and padding are ignored and lowercase letters are accepted.
fn decode_secret(secret: &str) -> AuthResult<Vec<u8>> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(AuthError::MissingOtpSecret);
    }

    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|e| AuthError::InvalidOtpSecret(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Base32 of the RFC 6238 SHA1 seed "12345678901234567890"
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_rfc6238_vectors_eight_digits() {
        let totp = Totp::new(30, 8);
        let s = secret(RFC_SECRET);
        assert_eq!(totp.generate(&s, at(59)).unwrap(), "94287082");
        assert_eq!(totp.generate(&s, at(1111111109)).unwrap(), "07081804");
        assert_eq!(totp.generate(&s, at(1234567890)).unwrap(), "89005924");
        assert_eq!(totp.generate(&s, at(2000000000)).unwrap(), "69279037");
    }

    #[test]
    fn test_default_is_six_digits() {
        let s = secret(RFC_SECRET);
        let code = Totp::default().generate(&s, at(1111111109)).unwrap();
        assert_eq!(code, "081804");
    }

    #[test]
    fn test_same_window_same_code() {
        let totp = Totp::default();
        let s = secret(RFC_SECRET);
        assert_eq!(
            totp.generate(&s, at(1_700_000_010)).unwrap(),
            totp.generate(&s, at(1_700_000_019)).unwrap()
        );
    }

    #[test]
    fn test_secret_formatting_is_tolerated() {
        let totp = Totp::default();
        let plain = totp.generate(&secret(RFC_SECRET), at(59)).unwrap();
        let spaced = totp
            .generate(&secret("gezd gnbv gy3t qojq gezd gnbv gy3t qojq"), at(59))
            .unwrap();
        assert_eq!(plain, spaced);
    }

    #[test]
    fn test_invalid_secret() {
        let result = Totp::default().generate(&secret("not-base32!"), at(59));
        assert!(matches!(result, Err(AuthError::InvalidOtpSecret(_))));

        let result = Totp::default().generate(&secret("   "), at(59));
        assert!(matches!(result, Err(AuthError::MissingOtpSecret)));
    }

    #[test]
    fn test_pre_epoch_time_rejected() {
        let result = Totp::default().generate(&secret(RFC_SECRET), at(-10));
        assert!(matches!(result, Err(AuthError::SystemClock)));
    }
}
