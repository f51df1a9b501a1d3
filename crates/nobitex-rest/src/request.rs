//! Request descriptors
//!
//! A [`Request`] describes one API call: verb, endpoint, optional version
//! segment, whether it needs the API key and/or a one-time code, an optional
//! parameter object, and an optional deadline. It is built once per call and
//! consumed by the pipeline.

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use tokio::time::Instant;

use crate::transport::{Operation, TransportError};

/// Description of a single API call
///
/// `B` is the parameter object. For GET it is encoded as query parameters,
/// for every other verb as a JSON body.
#[derive(Debug)]
pub struct Request<'a, B: ?Sized = ()> {
    method: Method,
    endpoint: String,
    version: Option<&'static str>,
    requires_auth: bool,
    requires_otp: bool,
    body: Option<&'a B>,
    deadline: Option<Instant>,
}

impl Request<'static, ()> {
    /// Create a request with no parameters
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            version: None,
            requires_auth: false,
            requires_otp: false,
            body: None,
            deadline: None,
        }
    }

    /// Read-style call
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// Write-style call
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }
}

impl<'a, B: Serialize + ?Sized> Request<'a, B> {
    /// Prefix the endpoint with a version segment such as `"v2"`
    pub fn version(mut self, version: &'static str) -> Self {
        self.version = (!version.is_empty()).then_some(version);
        self
    }

    /// Require `Authorization: Token <key>`
    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Require the `X-TOTP` header
    pub fn with_otp(mut self) -> Self {
        self.requires_otp = true;
        self
    }

    /// Give up after `timeout`, counted from now
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Give up at `deadline`
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a parameter object
    pub fn body<'b, C: Serialize + ?Sized>(self, body: &'b C) -> Request<'b, C> {
        Request {
            method: self.method,
            endpoint: self.endpoint,
            version: self.version,
            requires_auth: self.requires_auth,
            requires_otp: self.requires_otp,
            body: Some(body),
            deadline: self.deadline,
        }
    }

    /// HTTP verb
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Endpoint path, without version
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the API key is needed
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Whether a one-time code is needed
    pub fn requires_otp(&self) -> bool {
        self.requires_otp
    }

    /// Deadline, if any
    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// `{base}{endpoint}` or `{base}/{version}{endpoint}`
    ///
    /// `base` has no trailing slash and `endpoint` starts with one.
    pub fn url(&self, base: &str) -> String {
        match self.version {
            Some(version) => format!("{}/{}{}", base, version, self.endpoint),
            None => format!("{}{}", base, self.endpoint),
        }
    }

    /// Final URL and body: query string for GET, JSON otherwise
    pub(crate) fn encode(&self, base: &str) -> Result<(String, Option<Vec<u8>>), TransportError> {
        let mut url = self.url(base);

        let Some(body) = self.body else {
            return Ok((url, None));
        };

        if self.method == Method::GET {
            let query = encode_query(body)?;
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
            Ok((url, None))
        } else {
            let json = serde_json::to_vec(body)
                .map_err(|e| TransportError::new(Operation::CreatingRequest, e))?;
            Ok((url, Some(json)))
        }
    }
}

/// Encode a parameter object as `a=b&c=d`
///
/// Fields appear in declaration order; `None` fields are skipped when the
/// type marks them with `skip_serializing_if`.
pub fn encode_query<B: Serialize + ?Sized>(params: &B) -> Result<String, TransportError> {
    serde_urlencoded::to_string(params).map_err(|e| TransportError::new(Operation::CreatingRequest, e))
}
