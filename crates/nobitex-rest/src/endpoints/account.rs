//! Account endpoints

use std::time::Duration;

use tracing::instrument;

use super::bounded;
use crate::client::NobitexClient;
use crate::error::RestResult;
use crate::request::Request;
use crate::types::{WalletsParams, WalletsResponse};

/// Account endpoints (require authentication)
#[derive(Debug, Clone, Copy)]
pub struct AccountEndpoints<'a> {
    client: &'a NobitexClient,
    timeout: Option<Duration>,
}

impl<'a> AccountEndpoints<'a> {
    /// Wallet calls through `client`, with no per-call timeout
    pub fn new(client: &'a NobitexClient) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Give up on each call after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get wallet balances
    #[instrument(skip(self, params))]
    pub async fn get_wallets(&self, params: &WalletsParams) -> RestResult<WalletsResponse> {
        let request = Request::get("/wallets")
            .version("v2")
            .authenticated()
            .body(params);
        self.client.execute(bounded(request, self.timeout)).await
    }
}
