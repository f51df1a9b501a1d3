//! Request pipeline: headers, dispatch, status handling
//!
//! The pipeline does not know about sessions. The caller resolves the API key
//! and one-time code first and passes them in, which keeps login itself (an
//! unauthenticated call that needs a one-time code) on the same path as every
//! other request.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::error::{ApiError, RestError, RestResult};
use crate::request::Request;
use crate::transport::{HttpTransport, Operation, TransportError, WireRequest};

/// Production API address
pub const BASE_URL: &str = "https://apiv2.nobitex.ir";

/// Prefix of the caller-identifying `User-Agent` header
pub const USER_AGENT_PREFIX: &str = "TraderBot/";

/// Header carrying the one-time code
pub const OTP_HEADER: &str = "X-TOTP";

/// Builds wire requests and interprets responses
#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    user_agent: Option<String>,
}

impl Pipeline {
    /// Create a pipeline over `transport`
    ///
    /// A trailing slash on `base_url` is dropped.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        user_agent: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            user_agent: user_agent.filter(|ua| !ua.is_empty()),
        }
    }

    /// Base address without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configured caller identity, without prefix
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Send `request` and return the body of a 2xx response
    ///
    /// `key` must be present when the request requires auth, `otp` when it
    /// requires a one-time code. Non-2xx responses become [`RestError::Api`].
    #[instrument(
        skip(self, request, key, otp),
        fields(method = %request.method(), endpoint = request.endpoint())
    )]
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        request: &Request<'_, B>,
        key: Option<&str>,
        otp: Option<&str>,
    ) -> RestResult<Vec<u8>> {
        let headers = self.headers(request, key, otp)?;
        let (url, body) = request.encode(&self.base_url)?;

        let timeout = match request.deadline_at() {
            Some(deadline) => {
                let now = Instant::now();
                if deadline <= now {
                    warn!("Deadline already passed, not sending");
                    return Err(TransportError::deadline_exceeded(Operation::SendingRequest).into());
                }
                Some(deadline - now)
            }
            None => None,
        };

        let wire = WireRequest {
            method: request.method().clone(),
            url,
            headers,
            body,
            timeout,
        };

        debug!("Sending request");

        let response = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(wire))
                .await
                .map_err(|_| TransportError::deadline_exceeded(Operation::SendingRequest))??,
            None => self.transport.send(wire).await?,
        };

        if !response.is_success() {
            let error = ApiError::from_response(response.status, &response.body);
            debug!(status = response.status, message = %error.message, "API returned error");
            return Err(error.into());
        }

        Ok(response.body)
    }

    fn headers<B: Serialize + ?Sized>(
        &self,
        request: &Request<'_, B>,
        key: Option<&str>,
        otp: Option<&str>,
    ) -> RestResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if request.requires_auth() || request.requires_otp() {
            let agent = self.user_agent.as_deref().ok_or_else(|| {
                RestError::configuration("UserAgent is empty, please set a user agent")
            })?;
            headers.insert(
                USER_AGENT,
                header_value(&format!("{}{}", USER_AGENT_PREFIX, agent))?,
            );
        }

        if request.requires_auth() {
            let key = key.filter(|k| !k.is_empty()).ok_or(nobitex_auth::SessionError::NoKey)?;
            headers.insert(AUTHORIZATION, header_value(&format!("Token {}", key))?);
        }

        if request.requires_otp() {
            let code = otp.filter(|c| !c.is_empty()).ok_or_else(|| {
                RestError::configuration("one-time code required but no OTP secret or code is configured")
            })?;
            headers.insert(OTP_HEADER, header_value(code)?);
        }

        Ok(headers)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn header_value(value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value).map_err(|e| TransportError::new(Operation::CreatingRequest, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use std::time::Duration;

    fn pipeline(transport: Arc<MockTransport>, user_agent: Option<&str>) -> Pipeline {
        Pipeline::new(transport, "https://mock.test/", user_agent.map(String::from))
    }

    #[tokio::test]
    async fn test_public_request_has_only_content_type() {
        let transport = Arc::new(MockTransport::new());
        transport.on("/market/stats", 200, r#"{"status":"ok"}"#);
        let pipeline = pipeline(transport.clone(), None);

        let body = pipeline.send(&Request::get("/market/stats"), None, None).await.unwrap();
        assert_eq!(body, br#"{"status":"ok"}"#.to_vec());

        let sent = transport.sent();
        assert_eq!(sent[0].url, "https://mock.test/market/stats");
        assert_eq!(sent[0].header("content-type"), Some("application/json"));
        assert!(sent[0].header("authorization").is_none());
        assert!(sent[0].header("x-totp").is_none());
    }

    #[tokio::test]
    async fn test_auth_headers() {
        let transport = Arc::new(MockTransport::new());
        transport.on("/v2/wallets", 200, "{}");
        let pipeline = pipeline(transport.clone(), Some("MyBot/1.0"));

        let request = Request::get("/wallets").version("v2").authenticated();
        pipeline.send(&request, Some("abc123"), None).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].header("authorization"), Some("Token abc123"));
        assert_eq!(sent[0].header("user-agent"), Some("TraderBot/MyBot/1.0"));
    }

    #[tokio::test]
    async fn test_missing_user_agent_fails_before_network() {
        let transport = Arc::new(MockTransport::new());
        let pipeline = pipeline(transport.clone(), None);

        let request = Request::get("/wallets").authenticated();
        let err = pipeline.send(&request, Some("abc"), None).await.unwrap_err();
        assert!(err.is_configuration());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_authentication_error() {
        let transport = Arc::new(MockTransport::new());
        let pipeline = pipeline(transport.clone(), Some("bot"));

        let request = Request::get("/wallets").authenticated();
        let err = pipeline.send(&request, Some(""), None).await.unwrap_err();
        assert!(err.is_authentication());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_otp_header_without_auth() {
        let transport = Arc::new(MockTransport::new());
        transport.on("/auth/login/", 200, r#"{"status":"success","key":"k"}"#);
        let pipeline = pipeline(transport.clone(), Some("bot"));

        let request = Request::post("/auth/login/").with_otp();
        pipeline.send(&request, None, Some("123456")).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].header("x-totp"), Some("123456"));
        assert!(sent[0].header("authorization").is_none());
    }

    #[tokio::test]
    async fn test_missing_otp_is_configuration_error() {
        let transport = Arc::new(MockTransport::new());
        let pipeline = pipeline(transport.clone(), Some("bot"));

        let err = pipeline
            .send(&Request::post("/auth/login/").with_otp(), None, None)
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_non_2xx_is_normalized() {
        let transport = Arc::new(MockTransport::new());
        transport.on("/market/orders/add", 400, r#"{"status":"failed","code":"InvalidOrderPrice","message":"bad price"}"#);
        let pipeline = pipeline(transport, Some("bot"));

        let err = pipeline
            .send(&Request::post("/market/orders/add").authenticated(), Some("k"), None)
            .await
            .unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.status_code, 400);
        assert_eq!(api.code.as_deref(), Some("InvalidOrderPrice"));
        assert_eq!(api.message, "bad price");
    }

    #[tokio::test]
    async fn test_transport_failure_carries_operation() {
        let transport = Arc::new(MockTransport::new());
        transport.fail("/market/stats", Operation::ReadingResponse);
        let pipeline = pipeline(transport, None);

        let err = pipeline.send(&Request::get("/market/stats"), None, None).await.unwrap_err();
        match err {
            RestError::Transport(e) => assert_eq!(e.operation(), Operation::ReadingResponse),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_deadline_skips_network() {
        let transport = Arc::new(MockTransport::new());
        let pipeline = pipeline(transport.clone(), None);

        let request = Request::get("/market/stats").timeout(Duration::ZERO);
        let err = pipeline.send(&request, None, None).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_cuts_slow_transport_short() {
        let transport = Arc::new(MockTransport::new().with_delay(Duration::from_secs(10)));
        transport.on("/market/stats", 200, "{}");
        let pipeline = pipeline(transport, None);

        let started = std::time::Instant::now();
        let request = Request::get("/market/stats").timeout(Duration::from_millis(50));
        let err = pipeline.send(&request, None, None).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
