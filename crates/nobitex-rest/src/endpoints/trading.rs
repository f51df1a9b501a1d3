//! Trading endpoints for order management
//!
//! These endpoints require authentication.

use std::time::Duration;

use tracing::{debug, instrument};

use super::bounded;
use crate::client::NobitexClient;
use crate::error::RestResult;
use crate::request::Request;
use crate::types::{
    CancelOrderParams, CancelOrdersBulkParams, CreateOrderParams, OrderResponse, OrderStatusParams,
    OrdersListParams, OrdersListResponse, StatusResponse, UserTradesParams, UserTradesResponse,
    CANCELED_STATUS,
};

/// Status filter used by [`TradingEndpoints::get_open_orders`]
const OPEN_STATUS: &str = "open";

/// Trading endpoints for order management
#[derive(Debug, Clone, Copy)]
pub struct TradingEndpoints<'a> {
    client: &'a NobitexClient,
    timeout: Option<Duration>,
}

impl<'a> TradingEndpoints<'a> {
    /// Order calls through `client`, with no per-call timeout
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

    /// Place a new order
    #[instrument(
        skip(self, order),
        fields(src = %order.src_currency, dst = %order.dst_currency, side = %order.side, execution = ?order.execution)
    )]
    pub async fn create_order(&self, order: &CreateOrderParams) -> RestResult<OrderResponse> {
        debug!("Placing order");
        let request = Request::post("/market/orders/add").authenticated().body(order);
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// Cancel a single order
    ///
    /// The status sent is always `canceled`, whatever `params` holds.
    /// Cancelling an already-cancelled order is acknowledged the same way.
    #[instrument(skip(self, params), fields(id = ?params.id, client_order_id = ?params.client_order_id))]
    pub async fn cancel_order(&self, params: &CancelOrderParams) -> RestResult<StatusResponse> {
        let mut params = params.clone();
        params.status = CANCELED_STATUS.to_string();

        let request = Request::post("/market/orders/update-status")
            .authenticated()
            .body(&params);
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// Cancel every order matching the filters
    #[instrument(skip(self, params))]
    pub async fn cancel_orders_bulk(&self, params: &CancelOrdersBulkParams) -> RestResult<StatusResponse> {
        let request = Request::post("/market/orders/cancel-old")
            .authenticated()
            .body(params);
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// List orders matching the filters
    #[instrument(skip(self, params))]
    pub async fn get_orders_history(&self, params: &OrdersListParams) -> RestResult<OrdersListResponse> {
        let request = Request::get("/market/orders/list").authenticated().body(params);
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// List open orders; any status filter in `params` is replaced
    #[instrument(skip(self, params))]
    pub async fn get_open_orders(&self, params: &OrdersListParams) -> RestResult<OrdersListResponse> {
        let params = params.clone().with_status(OPEN_STATUS);
        let request = Request::get("/market/orders/list").authenticated().body(&params);
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// Get one order by exchange id or client id
    #[instrument(skip(self, params), fields(id = ?params.id, client_order_id = ?params.client_order_id))]
    pub async fn get_order_status(&self, params: &OrderStatusParams) -> RestResult<OrderResponse> {
        let request = Request::post("/market/orders/status").authenticated().body(params);
        self.client.execute(bounded(request, self.timeout)).await
    }

    /// Get the user's fills
    #[instrument(skip(self, params))]
    pub async fn get_user_trades(&self, params: &UserTradesParams) -> RestResult<UserTradesResponse> {
        let request = Request::get("/market/trades/list").authenticated().body(params);
        self.client.execute(bounded(request, self.timeout)).await
    }
}
