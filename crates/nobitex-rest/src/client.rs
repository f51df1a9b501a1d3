//! Main REST client implementation

use std::sync::Arc;
use std::time::Duration;

use nobitex_auth::{Credentials, OtpProvider, RememberMode, Session, Totp};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::endpoints::{AccountEndpoints, MarketEndpoints, TradingEndpoints};
use crate::error::{RestError, RestResult};
use crate::pipeline::{Pipeline, BASE_URL};
use crate::request::Request;
use crate::session::SessionManager;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{
    CancelOrderParams, CancelOrdersBulkParams, CreateOrderParams, LoginResponse, OptionsResponse,
    OrderBook, OrderResponse, OrderStatusParams, OrdersListParams, OrdersListResponse,
    StatusResponse, TickersParams, TickersResponse, TradesResponse, UserTradesParams,
    UserTradesResponse, WalletsParams, WalletsResponse,
};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Nobitex REST API client
///
/// Cheap to clone; clones share one session, so a refresh triggered through
/// any of them is seen by all.
///
/// # Example
///
/// ```no_run
/// use nobitex_rest::{NobitexClient, Credentials, TickersParams};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     // Public endpoints only
///     let client = NobitexClient::new()?;
///     let stats = client.get_tickers(&TickersParams::new("btc", "rls")).await?;
///
///     // Log in for private endpoints
///     let creds = Credentials::from_env()?;
///     let auth_client = NobitexClient::builder()
///         .with_credentials(creds)
///         .with_user_agent("MyBot/1.0")
///         .connect()
///         .await?;
///     let wallets = auth_client.get_wallets(&Default::default()).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct NobitexClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    pipeline: Pipeline,
    sessions: SessionManager,
    auto_refresh: bool,
}

impl NobitexClient {
    /// Create a client for public endpoints with default settings
    pub fn new() -> RestResult<Self> {
        ClientBuilder::new().build()
    }

    /// Start configuring a client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Request pipeline used by this client
    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// Session manager shared by all clones
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.inner.sessions.session()
    }

    /// Check if the client currently holds an API key
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// Log in with explicit credentials
    pub async fn authenticate(&self, username: &str, password: &str) -> RestResult<LoginResponse> {
        self.inner
            .sessions
            .authenticate(&self.inner.pipeline, username, password)
            .await
    }

    /// Log in with the configured credentials
    pub async fn login(&self) -> RestResult<LoginResponse> {
        self.inner
            .sessions
            .login_with_credentials(&self.inner.pipeline)
            .await
    }

    /// Log in again if the key is past its TTL
    ///
    /// May perform a login round-trip.
    pub async fn ensure_fresh(&self) -> RestResult<Session> {
        self.inner.sessions.ensure_fresh(&self.inner.pipeline).await
    }

    /// Run a request and decode the JSON response as `T`
    pub async fn execute<T, B>(&self, request: Request<'_, B>) -> RestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let body = self.send(&request).await?;
        serde_json::from_slice(&body).map_err(RestError::Decode)
    }

    /// Run a request and ignore the response body
    pub async fn execute_discard<B>(&self, request: Request<'_, B>) -> RestResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send(&request).await.map(|_| ())
    }

    #[instrument(skip(self, request), fields(endpoint = request.endpoint()))]
    async fn send<B>(&self, request: &Request<'_, B>) -> RestResult<Vec<u8>>
    where
        B: Serialize + ?Sized + Sync,
    {
        let inner = &self.inner;

        let key = if request.requires_auth() {
            Some(
                inner
                    .sessions
                    .authorize(&inner.pipeline, inner.auto_refresh, request.deadline_at())
                    .await?,
            )
        } else {
            None
        };

        let otp = if request.requires_otp() {
            Some(inner.sessions.one_time_code()?)
        } else {
            None
        };

        inner
            .pipeline
            .send(request, key.as_deref(), otp.as_deref())
            .await
    }

    // ========================================================================
    // Public Market Endpoints
    // ========================================================================

    /// Get market endpoints
    pub fn market(&self) -> MarketEndpoints<'_> {
        MarketEndpoints::new(self)
    }

    /// Get supported currencies and precision limits
    pub async fn get_options(&self) -> RestResult<OptionsResponse> {
        self.market().get_options().await
    }

    /// Get 24h statistics for a market
    pub async fn get_tickers(&self, params: &TickersParams) -> RestResult<TickersResponse> {
        self.market().get_tickers(params).await
    }

    /// Get orderbook depth for a market such as `BTCIRT`
    pub async fn get_orderbook(&self, symbol: &str) -> RestResult<OrderBook> {
        self.market().get_orderbook(symbol).await
    }

    /// Get recent public trades for a market
    pub async fn get_recent_trades(&self, symbol: &str) -> RestResult<TradesResponse> {
        self.market().get_recent_trades(symbol).await
    }

    // ========================================================================
    // Private Account Endpoints
    // ========================================================================

    /// Get account endpoints
    pub fn account(&self) -> AccountEndpoints<'_> {
        AccountEndpoints::new(self)
    }

    /// Get wallet balances
    pub async fn get_wallets(&self, params: &WalletsParams) -> RestResult<WalletsResponse> {
        self.account().get_wallets(params).await
    }

    // ========================================================================
    // Private Trading Endpoints
    // ========================================================================

    /// Get trading endpoints
    pub fn trading(&self) -> TradingEndpoints<'_> {
        TradingEndpoints::new(self)
    }

    /// Place a new order
    pub async fn create_order(&self, order: &CreateOrderParams) -> RestResult<OrderResponse> {
        self.trading().create_order(order).await
    }

    /// Cancel an order
    pub async fn cancel_order(&self, params: &CancelOrderParams) -> RestResult<StatusResponse> {
        self.trading().cancel_order(params).await
    }

    /// Cancel orders matching the filters
    pub async fn cancel_orders_bulk(&self, params: &CancelOrdersBulkParams) -> RestResult<StatusResponse> {
        self.trading().cancel_orders_bulk(params).await
    }

    /// List orders
    pub async fn get_orders_history(&self, params: &OrdersListParams) -> RestResult<OrdersListResponse> {
        self.trading().get_orders_history(params).await
    }

    /// List open orders
    pub async fn get_open_orders(&self, params: &OrdersListParams) -> RestResult<OrdersListResponse> {
        self.trading().get_open_orders(params).await
    }

    /// Get one order
    pub async fn get_order_status(&self, params: &OrderStatusParams) -> RestResult<OrderResponse> {
        self.trading().get_order_status(params).await
    }

    /// Get the user's fills
    pub async fn get_user_trades(&self, params: &UserTradesParams) -> RestResult<UserTradesResponse> {
        self.trading().get_user_trades(params).await
    }
}

impl std::fmt::Debug for NobitexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NobitexClient")
            .field("base_url", &self.inner.pipeline.base_url())
            .field("authenticated", &self.is_authenticated())
            .field("auto_refresh", &self.inner.auto_refresh)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Client configuration
///
/// Nothing touches the network until [`ClientBuilder::connect`] or the first
/// request.
pub struct ClientBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    http_client: Option<reqwest::Client>,
    timeout: Duration,
    base_url: String,
    credentials: Option<Credentials>,
    otp_secret: Option<String>,
    otp_code: Option<String>,
    remember: RememberMode,
    remember_raw: Option<String>,
    user_agent: Option<String>,
    api_key: Option<String>,
    auto_auth: bool,
    auto_refresh: bool,
    otp_provider: Option<Arc<dyn OtpProvider>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            transport: None,
            http_client: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: BASE_URL.to_string(),
            credentials: None,
            otp_secret: None,
            otp_code: None,
            remember: RememberMode::default(),
            remember_raw: None,
            user_agent: None,
            api_key: None,
            auto_auth: true,
            auto_refresh: true,
            otp_provider: None,
        }
    }
}

impl ClientBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from `NOBITEX_*` environment variables
    ///
    /// Credentials are picked up only when both `NOBITEX_USERNAME` and
    /// `NOBITEX_PASSWORD` are set. Unset variables leave defaults in place.
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Ok(credentials) = Credentials::from_env() {
            builder = builder.with_credentials(credentials);
        }
        if let Some(agent) = var("NOBITEX_USER_AGENT") {
            builder = builder.with_user_agent(agent);
        }
        if let Some(key) = var("NOBITEX_API_KEY") {
            builder = builder.with_api_key(key);
        }
        if let Ok(remember) = std::env::var("NOBITEX_REMEMBER") {
            builder = builder.with_remember_str(remember);
        }
        if let Some(url) = var("NOBITEX_BASE_URL") {
            builder = builder.with_base_url(url);
        }
        builder
    }

    /// Use a custom transport; overrides the HTTP client and timeout
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a preconfigured reqwest client
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the transport-wide timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the API address
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set login credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the base32 secret for one-time codes
    pub fn with_otp_secret(mut self, secret: impl Into<String>) -> Self {
        self.otp_secret = Some(secret.into());
        self
    }

    /// Set a pre-generated one-time code
    pub fn with_otp_code(mut self, code: impl Into<String>) -> Self {
        self.otp_code = Some(code.into());
        self
    }

    /// Set the remember mode
    pub fn with_remember(mut self, remember: RememberMode) -> Self {
        self.remember = remember;
        self.remember_raw = None;
        self
    }

    /// Set the remember mode from its wire value (`"yes"`, `"no"` or `""`)
    ///
    /// Unknown values make [`build`](Self::build) fail.
    pub fn with_remember_str(mut self, remember: impl Into<String>) -> Self {
        self.remember_raw = Some(remember.into());
        self
    }

    /// Set the caller identity sent as `User-Agent: TraderBot/<agent>`
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use a key issued earlier instead of logging in
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Log in during [`connect`](Self::connect) when no key is set
    pub fn with_auto_auth(mut self, enabled: bool) -> Self {
        self.auto_auth = enabled;
        self
    }

    /// Log in again before authenticated calls once the key is stale
    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    /// Replace the one-time code generator
    pub fn with_otp_provider(mut self, provider: Arc<dyn OtpProvider>) -> Self {
        self.otp_provider = Some(provider);
        self
    }

    /// Build the client without any network I/O
    pub fn build(self) -> RestResult<NobitexClient> {
        let remember = match &self.remember_raw {
            Some(raw) => raw.parse::<RememberMode>()?,
            None => self.remember,
        };

        let transport: Arc<dyn HttpTransport> = match (self.transport, self.http_client) {
            (Some(transport), _) => transport,
            (None, Some(client)) => Arc::new(ReqwestTransport::from_client(client)),
            (None, None) => Arc::new(ReqwestTransport::new(self.timeout)?),
        };

        let credentials = self.credentials.map(|mut credentials| {
            if let Some(secret) = self.otp_secret {
                credentials = credentials.with_otp_secret(secret);
            }
            if let Some(code) = self.otp_code {
                credentials = credentials.with_otp_code(code);
            }
            credentials
        });

        let otp = self
            .otp_provider
            .unwrap_or_else(|| Arc::new(Totp::default()));

        let pipeline = Pipeline::new(transport, self.base_url, self.user_agent);
        let sessions = SessionManager::new(credentials, remember, otp);

        if let Some(key) = self.api_key.filter(|k| !k.is_empty()) {
            debug!("Using pre-issued API key");
            sessions.set_session(Session::new(key, remember));
        }

        info!(base_url = pipeline.base_url(), remember = %remember, "Created Nobitex REST client");

        Ok(NobitexClient {
            inner: Arc::new(ClientInner {
                pipeline,
                sessions,
                auto_refresh: self.auto_refresh,
            }),
        })
    }

    /// Build the client, then log in and check freshness as configured
    ///
    /// Logs in when auto-auth is on, no key was supplied, and credentials
    /// plus a one-time code source are present.
    pub async fn connect(self) -> RestResult<NobitexClient> {
        let auto_auth = self.auto_auth;
        let auto_refresh = self.auto_refresh;
        let client = self.build()?;

        if auto_auth && !client.is_authenticated() && client.sessions().can_login() {
            client.login().await?;
        }

        if auto_refresh {
            client.ensure_fresh().await?;
        }

        Ok(client)
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("credentials", &self.credentials)
            .field("remember", &self.remember)
            .field("user_agent", &self.user_agent)
            .field("has_api_key", &self.api_key.is_some())
            .field("auto_auth", &self.auto_auth)
            .field("auto_refresh", &self.auto_refresh)
            .finish()
    }
}
