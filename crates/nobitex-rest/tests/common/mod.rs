//! Shared fixtures for integration tests against a fake exchange
//!
//! Response bodies follow the shapes documented for the Nobitex API.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nobitex_rest::{ClientBuilder, Credentials, NobitexClient, OtpProvider};
use secrecy::SecretString;
use wiremock::MockServer;

/// Code returned by [`FixedCode`]
pub const TEST_OTP: &str = "123456";

/// User agent configured on every test client
pub const TEST_AGENT: &str = "it-bot/0.1";

/// Successful login
pub const LOGIN_RESPONSE: &str = r#"{"status":"success","key":"it-key","device":"it-device"}"#;

/// Orderbook snapshot for BTCIRT
pub const ORDERBOOK_RESPONSE: &str = r#"{
    "status": "ok",
    "lastUpdate": 1700000000000,
    "lastTradePrice": "2150000000",
    "asks": [["2150100000", "0.05"], ["2150200000", "0.30"]],
    "bids": [["2149900000", "0.12"], ["2149800000", "1.00"]]
}"#;

/// Wallets for the logged-in user
pub const WALLETS_RESPONSE: &str = r#"{
    "status": "ok",
    "wallets": {
        "btc": {"id": 1, "balance": "0.25", "blocked": "0.05"},
        "rls": {"id": 2, "balance": "0", "blocked": "0"}
    }
}"#;

/// Ack for cancel calls
pub const OK_RESPONSE: &str = r#"{"status":"ok"}"#;

/// One-time code source that always returns [`TEST_OTP`]
pub struct FixedCode;

impl OtpProvider for FixedCode {
    fn generate(&self, _secret: &SecretString, _at: DateTime<Utc>) -> nobitex_auth::AuthResult<String> {
        Ok(TEST_OTP.to_string())
    }
}

/// Builder pointed at `server` with a fixed one-time code
pub fn builder(server: &MockServer) -> ClientBuilder {
    NobitexClient::builder()
        .with_base_url(server.uri())
        .with_user_agent(TEST_AGENT)
        .with_otp_provider(Arc::new(FixedCode))
}

/// Credentials with an OTP secret so refresh is possible
pub fn credentials() -> Credentials {
    Credentials::new("trader@example.com", "correct horse").with_otp_secret("JBSWY3DPEHPK3PXP")
}
