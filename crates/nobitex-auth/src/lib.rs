//! Authentication building blocks for the Nobitex API
//!
//! This crate holds everything needed to log in and to decide when a login
//! must be repeated, without performing any network I/O itself:
//!
//! - [`Credentials`]: username, password and one-time-code material
//! - [`OtpProvider`] / [`Totp`]: RFC 6238 one-time codes for the `X-TOTP` header
//! - [`RememberMode`] / [`Session`]: key lifetime rules and freshness checks
//!
//! # Example
//!
//! ```no_run
//! use nobitex_auth::{Credentials, OtpProvider, RememberMode, Session, Totp};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let creds = Credentials::from_env()?;
//! if let Some(secret) = creds.otp_secret() {
//!     let code = Totp::default().generate(secret, chrono::Utc::now())?;
//!     println!("X-TOTP: {}", code);
//! }
//!
//! let session = Session::new("key-from-login", RememberMode::LongLived);
//! println!("{:?}", session.freshness());
//! # Ok(())
//! # }
//! ```

mod credentials;
mod error;
mod otp;
mod session;

pub use credentials::Credentials;
pub use error::{AuthError, AuthResult};
pub use otp::{OtpProvider, Totp, DEFAULT_DIGITS, DEFAULT_STEP_SECS};
pub use session::{
    Freshness, RememberMode, Session, SessionError, LONG_LIVED_TTL, SHORT_LIVED_TTL,
};
