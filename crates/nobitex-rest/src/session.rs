//! Session lifecycle: login, staleness, single-flight refresh
//!
//! [`SessionManager::check`] is a pure freshness test. Anything that may hit
//! the network takes the [`Pipeline`] explicitly, so a caller can always tell
//! from the signature whether a login round-trip is possible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use nobitex_auth::{
    AuthError, Credentials, Freshness, OtpProvider, RememberMode, Session, SessionError,
};
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::{RestError, RestResult};
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::transport::{Operation, TransportError};
use crate::types::{LoginRequest, LoginResponse};

/// Login endpoint, unversioned
pub const LOGIN_ENDPOINT: &str = "/auth/login/";

/// Captcha marker for programmatic logins
pub const API_CAPTCHA: &str = "api";

/// Owns credentials and the current session
///
/// Shared by every clone of a client. Reads never block on a refresh in
/// progress: they see the session as it was before or after it, never a mix.
pub struct SessionManager {
    credentials: Option<Credentials>,
    remember: RememberMode,
    otp: Arc<dyn OtpProvider>,
    session: RwLock<Session>,
    current_otp: Mutex<Option<String>>,
    refresh: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    last_failure: Mutex<Option<(u64, Arc<RestError>)>>,
}

impl SessionManager {
    /// Create a manager with no key
    pub fn new(
        credentials: Option<Credentials>,
        remember: RememberMode,
        otp: Arc<dyn OtpProvider>,
    ) -> Self {
        let current_otp = credentials
            .as_ref()
            .and_then(|c| c.otp_code())
            .map(str::to_string);

        Self {
            credentials,
            remember,
            otp,
            session: RwLock::new(Session::unauthenticated(remember)),
            current_otp: Mutex::new(current_otp),
            refresh: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }

    /// Install a session obtained elsewhere, e.g. a pre-issued key
    pub fn set_session(&self, session: Session) {
        *self.session.write() = session;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// Remember mode used for logins and TTL
    pub fn remember(&self) -> RememberMode {
        self.remember
    }

    /// Credentials, if configured
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Whether this manager could log in without outside help
    pub fn can_login(&self) -> bool {
        self.credentials
            .as_ref()
            .map(|c| c.validate().is_ok() && c.can_produce_otp())
            .unwrap_or(false)
    }

    /// Pure staleness check; never performs I/O
    ///
    /// A session without a key is reported fresh: there is nothing to renew.
    pub fn check(&self) -> Freshness {
        let session = self.session.read();
        if !session.is_authenticated() {
            return Freshness::Fresh;
        }
        session.freshness_at(Utc::now())
    }

    /// The key, or an authentication error if there is none
    pub fn assert_authenticated(&self) -> Result<String, SessionError> {
        self.session.read().require_key().map(str::to_string)
    }

    /// Most recent one-time code, without generating a new one
    pub fn current_otp(&self) -> Option<String> {
        self.current_otp.lock().clone()
    }

    /// One-time code for the next request
    ///
    /// Generated from the shared secret when there is one, otherwise the
    /// pre-supplied code.
    pub fn one_time_code(&self) -> RestResult<String> {
        let credentials = self.credentials.as_ref();

        if let Some(secret) = credentials.and_then(Credentials::otp_secret) {
            let code = self.otp.generate(secret, Utc::now())?;
            *self.current_otp.lock() = Some(code.clone());
            return Ok(code);
        }

        self.current_otp().ok_or_else(|| RestError::Configuration {
            message: "one-time code required but no OTP secret or code is configured".to_string(),
            source: Some(AuthError::MissingOtpSecret),
        })
    }

    /// Log in and record the new key
    ///
    /// Empty username or password fails before any request is made. API
    /// errors from the login call are returned unchanged.
    #[instrument(skip(self, pipeline, password))]
    pub async fn authenticate(
        &self,
        pipeline: &Pipeline,
        username: &str,
        password: &str,
    ) -> RestResult<LoginResponse> {
        let _guard = self.refresh.lock().await;
        self.login(pipeline, username, password, None).await
    }

    /// Log in again with the stored credentials
    pub async fn login_with_credentials(&self, pipeline: &Pipeline) -> RestResult<LoginResponse> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            RestError::from(AuthError::MissingCredentials)
        })?;
        self.authenticate(pipeline, credentials.username(), credentials.password())
            .await
    }

    /// Return a fresh session, logging in again if the key is past its TTL
    ///
    /// May authenticate. Concurrent callers that find the key stale share a
    /// single login; if it fails they all receive the same
    /// [`RestError::RefreshFailed`].
    pub async fn ensure_fresh(&self, pipeline: &Pipeline) -> RestResult<Session> {
        self.ensure_fresh_until(pipeline, None).await
    }

    /// [`ensure_fresh`](Self::ensure_fresh) bounded by a call deadline
    ///
    /// A stale key with an elapsed deadline fails before any I/O. Waiting for
    /// another caller's refresh and the login itself both count against
    /// `deadline`. A refresh cut short by its deadline is not shared with
    /// waiters; they try again on their own budget.
    pub async fn ensure_fresh_until(
        &self,
        pipeline: &Pipeline,
        deadline: Option<Instant>,
    ) -> RestResult<Session> {
        let observed = self.generation.load(Ordering::Acquire);
        if self.check() == Freshness::Fresh {
            return Ok(self.session());
        }

        if deadline.is_some_and(|d| d <= Instant::now()) {
            debug!("Deadline passed before refresh could start");
            return Err(TransportError::deadline_exceeded(Operation::SendingRequest).into());
        }

        let _guard = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.refresh.lock())
                .await
                .map_err(|_| TransportError::deadline_exceeded(Operation::SendingRequest))?,
            None => self.refresh.lock().await,
        };

        let current = self.generation.load(Ordering::Acquire);
        if current != observed {
            let failure = self.last_failure.lock().clone();
            if let Some((generation, error)) = failure {
                if generation == current {
                    debug!("Joined a refresh that failed");
                    return Err(RestError::RefreshFailed(error));
                }
            }
            if self.check() == Freshness::Fresh {
                debug!("Joined a completed refresh");
                return Ok(self.session());
            }
        }

        if self.check() == Freshness::Fresh {
            return Ok(self.session());
        }

        let credentials = match &self.credentials {
            Some(credentials) if credentials.otp_secret().is_some() => credentials,
            _ => {
                warn!("API key is stale and cannot be refreshed");
                return Err(RestError::Configuration {
                    message: "OTP secret is empty, cannot refresh API key".to_string(),
                    source: Some(AuthError::MissingOtpSecret),
                });
            }
        };

        info!(remember = %self.remember, "API key is stale, logging in again");

        match self
            .login(pipeline, credentials.username(), credentials.password(), deadline)
            .await
        {
            Ok(_) => Ok(self.session()),
            Err(error) if error.is_timeout() => {
                warn!(%error, "Refresh ran out of time");
                Err(RestError::RefreshFailed(Arc::new(error)))
            }
            Err(error) => {
                let error = Arc::new(error);
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                *self.last_failure.lock() = Some((generation, error.clone()));
                warn!(%error, "Refresh failed");
                Err(RestError::RefreshFailed(error))
            }
        }
    }

    /// Key for an authenticated call
    ///
    /// With `auto_refresh` this may log in first, within `deadline`.
    pub async fn authorize(
        &self,
        pipeline: &Pipeline,
        auto_refresh: bool,
        deadline: Option<Instant>,
    ) -> RestResult<String> {
        if auto_refresh {
            self.ensure_fresh_until(pipeline, deadline).await?;
        }
        Ok(self.assert_authenticated()?)
    }

    async fn login(
        &self,
        pipeline: &Pipeline,
        username: &str,
        password: &str,
        deadline: Option<Instant>,
    ) -> RestResult<LoginResponse> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials.into());
        }

        let otp = self.one_time_code()?;
        let body = LoginRequest {
            username,
            password,
            captcha: API_CAPTCHA,
            remember: self.remember,
        };
        let mut request = Request::post(LOGIN_ENDPOINT).with_otp();
        if let Some(deadline) = deadline {
            request = request.deadline(deadline);
        }
        let request = request.body(&body);

        let bytes = pipeline.send(&request, None, Some(&otp)).await?;
        let response: LoginResponse = serde_json::from_slice(&bytes).map_err(RestError::Decode)?;

        if response.key.is_empty() {
            return Err(SessionError::EmptyLoginKey.into());
        }

        *self.session.write() = Session::new(response.key.clone(), self.remember);
        self.generation.fetch_add(1, Ordering::AcqRel);

        info!(remember = %self.remember, "Authenticated");
        Ok(response)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("remember", &self.remember)
            .field("session", &*self.session.read())
            .finish()
    }
}
