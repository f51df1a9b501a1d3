//! REST API client for the Nobitex cryptocurrency exchange
//!
//! This crate provides an async client for Nobitex market data, wallets, and
//! order management, built around a session manager that keeps the API key
//! fresh and a request pipeline that turns every failure into a typed error.
//!
//! # Features
//!
//! - **Market Data**: Options, tickers, orderbook, recent trades
//! - **Account**: Wallet balances
//! - **Trading**: Place, cancel, bulk-cancel, list, and query orders
//!
//! # Authentication
//!
//! Nobitex issues opaque API keys through a username/password login that
//! also requires a TOTP code. The key lives about 4 hours (`remember = "no"`)
//! or 30 days (`remember = "yes"`). With auto-refresh enabled the client logs
//! in again before the first authenticated call made after that, and
//! concurrent callers share a single login.
//!
//! # Example
//!
//! ```no_run
//! use nobitex_rest::{NobitexClient, Credentials, RememberMode, TickersParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Public endpoints (no auth required)
//!     let client = NobitexClient::new()?;
//!     let book = client.get_orderbook("BTCIRT").await?;
//!     println!("Spread: {:?}", book.spread());
//!
//!     // Private endpoints (auth required)
//!     let creds = Credentials::from_env()?;
//!     let auth_client = NobitexClient::builder()
//!         .with_credentials(creds)
//!         .with_remember(RememberMode::LongLived)
//!         .with_user_agent("MyBot/1.0")
//!         .connect()
//!         .await?;
//!     let wallets = auth_client.get_wallets(&Default::default()).await?;
//!     println!("Wallets: {:?}", wallets.non_zero());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod endpoints;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod session;
pub mod transport;
pub mod types;

// Re-export main types
pub use client::{ClientBuilder, NobitexClient};
pub use error::{ApiError, FieldValue, RestError, RestResult};
pub use pipeline::{Pipeline, BASE_URL, OTP_HEADER, USER_AGENT_PREFIX};
pub use request::Request;
pub use session::{SessionManager, LOGIN_ENDPOINT};
pub use transport::{HttpTransport, Operation, ReqwestTransport, TransportError, WireRequest, WireResponse};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockTransport;

pub use nobitex_auth::{Credentials, Freshness, OtpProvider, RememberMode, Session, SessionError, Totp};

// Re-export endpoint-specific types
pub use types::{
    // Market data
    NobitexOptions, OptionsResponse, OrderBook, Ticker, TickersParams, TickersResponse, Trade,
    TradesResponse,
    // Account
    Wallet, WalletsParams, WalletsResponse,
    // Trading
    CancelOrderParams, CancelOrdersBulkParams, CreateOrderParams, Execution, OrderDetail,
    OrderResponse, OrderSide, OrderStatusParams, OrdersListParams, OrdersListResponse, UserTrade,
    UserTradesParams, UserTradesResponse,
    // Responses
    LoginResponse, StatusResponse,
};
