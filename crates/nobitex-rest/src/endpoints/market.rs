//! Public market data endpoints
//!
//! These endpoints don't require authentication.

use std::time::Duration;

use tracing::{debug, instrument};

use super::bounded;
use crate::client::NobitexClient;
use crate::error::RestResult;
use crate::request::Request;
use crate::types::{OptionsResponse, OrderBook, TickersParams, TickersResponse, TradesResponse};

/// Public market data endpoints
#[derive(Debug, Clone, Copy)]
pub struct MarketEndpoints<'a> {
    client: &'a NobitexClient,
    timeout: Option<Duration>,
}

impl<'a> MarketEndpoints<'a> {
    /// Market data calls through `client`, with no per-call timeout
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

    /// Get supported currencies and precision limits
    #[instrument(skip(self))]
    pub async fn get_options(&self) -> RestResult<OptionsResponse> {
        debug!("Fetching platform options");
        let request = Request::get("/options").version("v2");
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// Get 24h statistics for a market
    #[instrument(skip(self), fields(src = %params.src_currency, dst = %params.dst_currency))]
    pub async fn get_tickers(&self, params: &TickersParams) -> RestResult<TickersResponse> {
        debug!("Fetching market stats");
        let request = Request::get("/market/stats").body(params);
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// Get orderbook depth for a market
    ///
    /// # Arguments
    /// * `symbol` - Market in Nobitex format, e.g. `BTCIRT` or `BTCUSDT`
    #[instrument(skip(self))]
    pub async fn get_orderbook(&self, symbol: &str) -> RestResult<OrderBook> {
        debug!("Fetching orderbook for {}", symbol);
        let request = Request::get(format!("/orderbook/{}", symbol)).version("v3");
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// Get recent public trades, newest first
    #[instrument(skip(self))]
    pub async fn get_recent_trades(&self, symbol: &str) -> RestResult<TradesResponse> {
        debug!("Fetching recent trades for {}", symbol);
        let request = Request::get(format!("/trades/{}", symbol)).version("v2");
        self.client.execute(bounded(request, self.timeout)).await
    }
}
