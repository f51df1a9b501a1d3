//! HTTP transport abstraction
//!
//! The request pipeline hands fully built requests to an [`HttpTransport`].
//! [`ReqwestTransport`] is the production implementation; [`MockTransport`]
//! lets the session and pipeline logic be tested without real network calls.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use tracing::{debug, instrument};

/// Boxed underlying cause of a transport failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stage of a request at which the transport failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Encoding parameters or assembling the HTTP request
    CreatingRequest,
    /// Connecting, sending, or waiting for the response head
    SendingRequest,
    /// Reading the response body
    ReadingResponse,
}

impl Operation {
    /// Human-readable label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatingRequest => "creating request",
            Self::SendingRequest => "sending request",
            Self::ReadingResponse => "reading response body",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call deadline elapsed before the transport finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline exceeded")]
pub struct DeadlineExceeded;

/// Transport layer error: which stage failed and why
#[derive(Debug, thiserror::Error)]
#[error("Transport error while {operation}: {source}")]
pub struct TransportError {
    operation: Operation,
    #[source]
    source: BoxError,
}

impl TransportError {
    /// Wrap a cause with the stage it happened in
    pub fn new(operation: Operation, source: impl Into<BoxError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    /// Deadline elapsed while at `operation`
    pub fn deadline_exceeded(operation: Operation) -> Self {
        Self::new(operation, DeadlineExceeded)
    }

    /// Stage that failed
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Whether the failure was a timeout, local or reported by reqwest
    pub fn is_timeout(&self) -> bool {
        if self.source.is::<DeadlineExceeded>() {
            return true;
        }
        self.source
            .downcast_ref::<reqwest::Error>()
            .map(reqwest::Error::is_timeout)
            .unwrap_or(false)
    }
}

/// A request ready for the wire
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// HTTP verb
    pub method: Method,
    /// Absolute URL including any query string
    pub url: String,
    /// Headers to send
    pub headers: HeaderMap,
    /// Encoded body
    pub body: Option<Vec<u8>>,
    /// Remaining time budget for this call
    pub timeout: Option<Duration>,
}

impl WireRequest {
    /// URL path without scheme, host, or query
    ///
    /// A URL that does not parse is returned up to its query string.
    pub fn path(&self) -> String {
        match Url::parse(&self.url) {
            Ok(url) => url.path().to_string(),
            Err(_) => self.url.split('?').next().unwrap_or_default().to_string(),
        }
    }

    /// Query string, if any
    pub fn query(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, q)| q)
    }

    /// Header value as text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Raw response from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl WireResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP transport abstraction
///
/// Implementations must be shareable across tasks; one transport serves
/// every call made through a client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and read the full response
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError>;
}

/// Real transport using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a global request timeout
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::new(Operation::CreatingRequest, e))?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path()))]
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let http_request = builder
            .build()
            .map_err(|e| TransportError::new(Operation::CreatingRequest, e))?;

        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(|e| TransportError::new(Operation::SendingRequest, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(Operation::ReadingResponse, e))?;

        debug!(status, len = body.len(), "Received response");

        Ok(WireResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Mock transport for testing
///
/// Replies are registered per path and repeat until replaced. Every request
/// is recorded so tests can assert on headers, bodies, and call counts.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockTransport {
    routes: parking_lot::Mutex<Vec<(String, MockReply)>>,
    /// Requests captured from send()
    pub requests: parking_lot::Mutex<Vec<WireRequest>>,
    delay: Option<Duration>,
}

#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
enum MockReply {
    Response(WireResponse),
    Fail(Operation),
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTransport {
    /// Create a mock with no routes; unrouted paths answer 404
    pub fn new() -> Self {
        Self {
            routes: parking_lot::Mutex::new(Vec::new()),
            requests: parking_lot::Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Wait this long before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer requests to `path` with `status` and `body`
    pub fn on(&self, path: &str, status: u16, body: impl Into<String>) -> &Self {
        let reply = MockReply::Response(WireResponse {
            status,
            body: body.into().into_bytes(),
        });
        self.set_route(path, reply);
        self
    }

    /// Fail requests to `path` at the given stage
    pub fn fail(&self, path: &str, operation: Operation) -> &Self {
        self.set_route(path, MockReply::Fail(operation));
        self
    }

    fn set_route(&self, path: &str, reply: MockReply) {
        let mut routes = self.routes.lock();
        routes.retain(|(p, _)| p != path);
        routes.push((path.to_string(), reply));
    }

    /// Number of requests sent to `path`
    pub fn calls_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path().ends_with(path))
            .count()
    }

    /// Snapshot of every request sent so far
    pub fn sent(&self) -> Vec<WireRequest> {
        self.requests.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let request_path = request.path();
        let reply = {
            let routes = self.routes.lock();
            routes
                .iter()
                .find(|(path, _)| request_path.ends_with(path.as_str()))
                .map(|(_, reply)| reply.clone())
        };
        self.requests.lock().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Fail(operation)) => {
                Err(TransportError::new(operation, "mock transport failure"))
            }
            None => Ok(WireResponse {
                status: 404,
                body: br#"{"status":"failed","message":"no mock route"}"#.to_vec(),
            }),
        }
    }
}
