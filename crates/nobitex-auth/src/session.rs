//! Session state and lifetime rules
//!
//! Nobitex API keys are opaque tokens with no embedded expiry. Their lifetime
//! is implied by the `remember` flag sent at login, so freshness is tracked
//! locally from the time of the last successful authentication.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::AuthError;

/// Lifetime of a short-lived ("remember = no") key
pub const SHORT_LIVED_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Lifetime of a long-lived ("remember = yes") key
pub const LONG_LIVED_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Session longevity requested at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RememberMode {
    /// `"no"`: key valid for about 4 hours
    ShortLived,
    /// `"yes"`: key valid for about 30 days
    LongLived,
    /// Empty value; the exchange treats it as short-lived
    #[default]
    Unspecified,
}

impl RememberMode {
    /// Wire value sent in the login body
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortLived => "no",
            Self::LongLived => "yes",
            Self::Unspecified => "",
        }
    }

    /// Expected key lifetime for this mode
    pub fn ttl(&self) -> Duration {
        match self {
            Self::ShortLived | Self::Unspecified => SHORT_LIVED_TTL,
            Self::LongLived => LONG_LIVED_TTL,
        }
    }
}

impl FromStr for RememberMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no" => Ok(Self::ShortLived),
            "yes" => Ok(Self::LongLived),
            "" => Ok(Self::Unspecified),
            other => Err(AuthError::UnknownRememberMode(other.to_string())),
        }
    }
}

impl fmt::Display for RememberMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RememberMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Result of a pure freshness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Key is within its TTL (or there is no key to refresh)
    Fresh,
    /// Key is older than its TTL; the next authenticated call must log in again
    Stale,
}

/// Current authentication state
///
/// An empty key means unauthenticated. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    key: String,
    authenticated_at: DateTime<Utc>,
    remember: RememberMode,
}

impl Session {
    /// Session with no key, timestamped now
    pub fn unauthenticated(remember: RememberMode) -> Self {
        Self::issued_at(String::new(), remember, Utc::now())
    }

    /// Session for a key obtained (or supplied) right now
    pub fn new(key: impl Into<String>, remember: RememberMode) -> Self {
        Self::issued_at(key, remember, Utc::now())
    }

    /// Session for a key obtained at a specific instant
    pub fn issued_at(
        key: impl Into<String>,
        remember: RememberMode,
        authenticated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            authenticated_at,
            remember,
        }
    }

    /// The API key (empty when unauthenticated)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a key is present
    pub fn is_authenticated(&self) -> bool {
        !self.key.is_empty()
    }

    /// When the key was last obtained
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }

    /// Remember mode the key was requested with
    pub fn remember(&self) -> RememberMode {
        self.remember
    }

    /// Time elapsed since authentication as seen at `now`
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.authenticated_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Freshness at `now`; stale iff elapsed strictly exceeds the TTL
    pub fn freshness_at(&self, now: DateTime<Utc>) -> Freshness {
        if self.elapsed_at(now) > self.remember.ttl() {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }

    /// Freshness right now
    pub fn freshness(&self) -> Freshness {
        self.freshness_at(Utc::now())
    }

    /// Borrow the key, failing if the session has none
    pub fn require_key(&self) -> Result<&str, SessionError> {
        if self.key.is_empty() {
            Err(SessionError::NoKey)
        } else {
            Ok(&self.key)
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("authenticated_at", &self.authenticated_at)
            .field("remember", &self.remember)
            .finish()
    }
}

/// Error for calls that need a key the session does not have
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No key has been obtained yet
    #[error("access token is empty")]
    NoKey,
    /// Login succeeded but the response carried no key
    #[error("login response did not include an API key")]
    EmptyLoginKey,
}
