//! Types for Nobitex REST API requests and responses

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use nobitex_auth::RememberMode;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn parse_decimal(value: &str) -> Option<Decimal> {
    value.trim().parse().ok()
}

/// Accept `"1.5"` or `1.5` and keep the text
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ============================================================================
// Authentication
// ============================================================================

/// Body of `POST /auth/login/`
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    /// Account email
    pub username: &'a str,
    /// Account password
    pub password: &'a str,
    /// Always `"api"` for programmatic logins
    pub captcha: &'a str,
    /// Requested key lifetime
    pub remember: RememberMode,
}

impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("captcha", &self.captcha)
            .field("remember", &self.remember)
            .finish()
    }
}

/// Successful login
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    /// Usually `"success"`
    #[serde(default)]
    pub status: String,
    /// API key for `Authorization: Token <key>`
    #[serde(default)]
    pub key: String,
    /// Device identifier assigned to the session
    #[serde(default)]
    pub device: Option<String>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("status", &self.status)
            .field("key", &"[REDACTED]")
            .field("device", &self.device)
            .finish()
    }
}

/// `{"status": "ok"}` style acknowledgment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    /// `"ok"` on success
    #[serde(default)]
    pub status: String,
}

impl StatusResponse {
    /// Whether the exchange reported `ok`
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

// ============================================================================
// Market Data Types
// ============================================================================

/// Platform-wide settings returned by `/v2/options`
#[derive(Debug, Clone, Deserialize)]
pub struct OptionsResponse {
    /// Nobitex settings block
    pub nobitex: NobitexOptions,
}

/// Supported currencies and precision limits
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NobitexOptions {
    /// Every currency the platform knows about
    pub all_currencies: Vec<String>,
    /// Currencies currently open for trading
    pub active_currencies: Vec<String>,
    /// Amount precision per currency
    pub amount_precisions: HashMap<String, String>,
    /// Price precision per currency
    pub price_precisions: HashMap<String, String>,
}

impl NobitexOptions {
    /// Whether `currency` is currently tradable
    pub fn is_active(&self, currency: &str) -> bool {
        self.active_currencies
            .iter()
            .any(|c| c.eq_ignore_ascii_case(currency))
    }
}

/// Query for `/market/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickersParams {
    /// Base currency, e.g. `btc`
    pub src_currency: String,
    /// Quote currency, e.g. `rls` or `usdt`
    pub dst_currency: String,
}

impl TickersParams {
    /// Tickers for one market
    pub fn new(src_currency: impl Into<String>, dst_currency: impl Into<String>) -> Self {
        Self {
            src_currency: src_currency.into(),
            dst_currency: dst_currency.into(),
        }
    }
}

/// 24h statistics for one market
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ticker {
    /// Market halted
    pub is_closed: bool,
    /// Lowest ask
    #[serde(deserialize_with = "string_or_number")]
    pub best_sell: String,
    /// Highest bid
    #[serde(deserialize_with = "string_or_number")]
    pub best_buy: String,
    /// Base currency volume
    #[serde(deserialize_with = "string_or_number")]
    pub volume_src: String,
    /// Quote currency volume
    #[serde(deserialize_with = "string_or_number")]
    pub volume_dst: String,
    /// Last trade price
    #[serde(deserialize_with = "string_or_number")]
    pub latest: String,
    /// Mark price
    #[serde(deserialize_with = "string_or_number")]
    pub mark: String,
    /// 24h low
    #[serde(deserialize_with = "string_or_number")]
    pub day_low: String,
    /// 24h high
    #[serde(deserialize_with = "string_or_number")]
    pub day_high: String,
    /// 24h open
    #[serde(deserialize_with = "string_or_number")]
    pub day_open: String,
    /// 24h close
    #[serde(deserialize_with = "string_or_number")]
    pub day_close: String,
    /// 24h change, percent
    #[serde(deserialize_with = "string_or_number")]
    pub day_change: String,
}

impl Ticker {
    /// Get the current ask price
    pub fn ask_price(&self) -> Option<Decimal> {
        parse_decimal(&self.best_sell)
    }

    /// Get the current bid price
    pub fn bid_price(&self) -> Option<Decimal> {
        parse_decimal(&self.best_buy)
    }

    /// Get the last trade price
    pub fn last_price(&self) -> Option<Decimal> {
        parse_decimal(&self.latest)
    }

    /// Get the spread between ask and bid
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.ask_price()? - self.bid_price()?)
    }
}

/// `/market/stats` response, keyed by market such as `btc-rls`
#[derive(Debug, Clone, Deserialize)]
pub struct TickersResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub stats: HashMap<String, Ticker>,
}

impl TickersResponse {
    /// Ticker for `src-dst`, case-insensitive
    pub fn get(&self, src_currency: &str, dst_currency: &str) -> Option<&Ticker> {
        let key = format!("{}-{}", src_currency, dst_currency).to_lowercase();
        self.stats.get(&key)
    }
}

/// Orderbook snapshot
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    #[serde(default)]
    pub status: String,
    /// Last update, Unix milliseconds
    #[serde(default)]
    pub last_update: i64,
    /// Price of the most recent trade
    #[serde(default, deserialize_with = "string_or_number")]
    pub last_trade_price: String,
    /// Ask levels `[price, amount]`, best first
    #[serde(default)]
    pub asks: Vec<Vec<String>>,
    /// Bid levels `[price, amount]`, best first
    #[serde(default)]
    pub bids: Vec<Vec<String>>,
}

impl OrderBook {
    /// Get the best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().and_then(|level| parse_decimal(level.first()?))
    }

    /// Get the best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().and_then(|level| parse_decimal(level.first()?))
    }

    /// Get the spread
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    /// Midpoint of best bid and ask
    pub fn mid_price(&self) -> Option<Decimal> {
        Some((self.best_ask()? + self.best_bid()?) / Decimal::from(2))
    }
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Public trade
#[derive(Debug, Clone, Deserialize)]
pub struct Trade {
    /// Execution time, Unix milliseconds
    #[serde(default)]
    pub time: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub volume: String,
    /// Taker side
    #[serde(rename = "type")]
    pub side: OrderSide,
}

impl Trade {
    /// Trade price as a decimal
    pub fn price(&self) -> Option<Decimal> {
        parse_decimal(&self.price)
    }

    /// Trade volume as a decimal
    pub fn volume(&self) -> Option<Decimal> {
        parse_decimal(&self.volume)
    }
}

/// Recent trades, newest first
#[derive(Debug, Clone, Deserialize)]
pub struct TradesResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub trades: Vec<Trade>,
}

// ============================================================================
// Account Types
// ============================================================================

/// Query for `/v2/wallets`
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalletsParams {
    /// Currencies to include, sent comma-separated; empty means all
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "comma_joined")]
    pub currencies: Vec<String>,
    /// `spot` or `margin`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<String>,
}

impl WalletsParams {
    /// Every wallet
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to these currencies
    pub fn with_currencies<I, S>(mut self, currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.currencies = currencies.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to `spot` or `margin` wallets
    pub fn with_trade_type(mut self, trade_type: impl Into<String>) -> Self {
        self.trade_type = Some(trade_type.into());
        self
    }
}

fn comma_joined<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&values.join(","))
}

/// One currency wallet
#[derive(Debug, Clone, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub id: i64,
    /// Total balance
    #[serde(default, deserialize_with = "string_or_number")]
    pub balance: String,
    /// Portion locked by open orders or withdrawals
    #[serde(default, deserialize_with = "string_or_number")]
    pub blocked: String,
}

impl Wallet {
    /// Total balance
    pub fn balance(&self) -> Option<Decimal> {
        parse_decimal(&self.balance)
    }

    /// Locked balance
    pub fn blocked(&self) -> Option<Decimal> {
        parse_decimal(&self.blocked)
    }

    /// Balance minus blocked
    pub fn available(&self) -> Option<Decimal> {
        Some(self.balance()? - self.blocked().unwrap_or(Decimal::ZERO))
    }
}

/// Wallets keyed by currency
#[derive(Debug, Clone, Deserialize)]
pub struct WalletsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub wallets: HashMap<String, Wallet>,
}

impl WalletsResponse {
    /// Wallets with a non-zero balance
    pub fn non_zero(&self) -> HashMap<&str, Decimal> {
        self.wallets
            .iter()
            .filter_map(|(currency, wallet)| {
                let balance = wallet.balance()?;
                (!balance.is_zero()).then_some((currency.as_str(), balance))
            })
            .collect()
    }
}

// ============================================================================
// Trading Types
// ============================================================================

/// How an order executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    Limit,
    Market,
    StopLimit,
    StopMarket,
}

/// Body of `POST /market/orders/add`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderParams {
    pub execution: Execution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_limit_price: Option<Decimal>,
    pub src_currency: String,
    pub dst_currency: String,
    #[serde(rename = "type")]
    pub side: OrderSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl CreateOrderParams {
    fn new(
        execution: Execution,
        src_currency: impl Into<String>,
        dst_currency: impl Into<String>,
        side: OrderSide,
        amount: Decimal,
    ) -> Self {
        Self {
            execution,
            stop_price: None,
            stop_limit_price: None,
            src_currency: src_currency.into(),
            dst_currency: dst_currency.into(),
            side,
            amount: Some(amount),
            price: None,
            client_order_id: None,
        }
    }

    /// Create a limit order
    pub fn limit(
        src_currency: impl Into<String>,
        dst_currency: impl Into<String>,
        side: OrderSide,
        amount: Decimal,
        price: Decimal,
    ) -> Self {
        let mut order = Self::new(Execution::Limit, src_currency, dst_currency, side, amount);
        order.price = Some(price);
        order
    }

    /// Create a market order
    pub fn market(
        src_currency: impl Into<String>,
        dst_currency: impl Into<String>,
        side: OrderSide,
        amount: Decimal,
    ) -> Self {
        Self::new(Execution::Market, src_currency, dst_currency, side, amount)
    }

    /// Create a stop-market order triggered at `stop_price`
    pub fn stop_market(
        src_currency: impl Into<String>,
        dst_currency: impl Into<String>,
        side: OrderSide,
        amount: Decimal,
        stop_price: Decimal,
    ) -> Self {
        let mut order = Self::new(Execution::StopMarket, src_currency, dst_currency, side, amount);
        order.stop_price = Some(stop_price);
        order
    }

    /// Create a stop-limit order: trigger at `stop_price`, rest at `price`
    pub fn stop_limit(
        src_currency: impl Into<String>,
        dst_currency: impl Into<String>,
        side: OrderSide,
        amount: Decimal,
        stop_price: Decimal,
        price: Decimal,
    ) -> Self {
        let mut order = Self::new(Execution::StopLimit, src_currency, dst_currency, side, amount);
        order.stop_price = Some(stop_price);
        order.price = Some(price);
        order
    }

    /// Set the stop-limit trigger
    pub fn with_stop_limit_price(mut self, price: Decimal) -> Self {
        self.stop_limit_price = Some(price);
        self
    }

    /// Set a client-chosen identifier
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }
}

/// Order identified by exchange id or client id
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl OrderStatusParams {
    /// By exchange-assigned id
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            client_order_id: None,
        }
    }

    /// By client-assigned id
    pub fn by_client_order_id(id: impl Into<String>) -> Self {
        Self {
            id: None,
            client_order_id: Some(id.into()),
        }
    }
}

/// Body of `POST /market/orders/update-status`
///
/// `status` is always sent as `canceled`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    pub status: String,
}

/// Status value the exchange expects for a cancel
pub const CANCELED_STATUS: &str = "canceled";

impl CancelOrderParams {
    /// Cancel by exchange-assigned id
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            client_order_id: None,
            status: CANCELED_STATUS.to_string(),
        }
    }

    /// Cancel by client-assigned id
    pub fn by_client_order_id(id: impl Into<String>) -> Self {
        Self {
            id: None,
            client_order_id: Some(id.into()),
            status: CANCELED_STATUS.to_string(),
        }
    }
}

/// Filters for `POST /market/orders/cancel-old`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrdersBulkParams {
    /// Only orders older than this many hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<Execution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_currency: Option<String>,
}

impl CancelOrdersBulkParams {
    /// Every open order
    pub fn all() -> Self {
        Self::default()
    }

    /// Orders older than `hours`
    pub fn older_than(hours: f64) -> Self {
        Self {
            hours: Some(hours),
            ..Self::default()
        }
    }

    /// Restrict to one market
    pub fn for_market(mut self, src_currency: impl Into<String>, dst_currency: impl Into<String>) -> Self {
        self.src_currency = Some(src_currency.into());
        self.dst_currency = Some(dst_currency.into());
        self
    }
}

/// Filters for `GET /market/orders/list`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersListParams {
    /// `open`, `done`, `all`, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub side: Option<OrderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<Execution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_currency: Option<String>,
    /// `1` for summary, `2` for full details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_id: Option<i64>,
    /// Sort field, e.g. `-created_at`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl OrdersListParams {
    /// No filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one market
    pub fn for_market(mut self, src_currency: impl Into<String>, dst_currency: impl Into<String>) -> Self {
        self.src_currency = Some(src_currency.into());
        self.dst_currency = Some(dst_currency.into());
        self
    }

    /// Filter by status
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Order as returned by status and create calls
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "type")]
    pub side: OrderSide,
    #[serde(default)]
    pub execution: Option<String>,
    #[serde(default)]
    pub src_currency: String,
    #[serde(default)]
    pub dst_currency: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub total_price: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub matched_amount: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub unmatched_amount: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub fee: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default, rename = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

impl OrderDetail {
    /// Order price
    pub fn price(&self) -> Option<Decimal> {
        parse_decimal(&self.price)
    }

    /// Submitted amount
    pub fn amount(&self) -> Option<Decimal> {
        parse_decimal(&self.amount)
    }

    /// Filled amount
    pub fn matched_amount(&self) -> Option<Decimal> {
        parse_decimal(&self.matched_amount)
    }

    /// Whether the order is still on the book
    pub fn is_open(&self) -> bool {
        self.status.eq_ignore_ascii_case("active") || self.status.eq_ignore_ascii_case("open")
    }
}

/// `{status, order}` wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub status: String,
    pub order: OrderDetail,
}

/// `{status, orders}` wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersListResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub orders: Vec<OrderDetail>,
}

/// Filters for `GET /market/trades/list`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTradesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_currency: Option<String>,
    /// Return trades after this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_id: Option<String>,
}

impl UserTradesParams {
    /// Trades in one market
    pub fn for_market(src_currency: impl Into<String>, dst_currency: impl Into<String>) -> Self {
        Self {
            src_currency: Some(src_currency.into()),
            dst_currency: Some(dst_currency.into()),
            from_id: None,
        }
    }
}

/// A fill on one of the user's orders
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTrade {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub order_id: String,
    #[serde(default)]
    pub src_currency: String,
    #[serde(default)]
    pub dst_currency: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub side: OrderSide,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub total: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub fee: String,
}

impl UserTrade {
    /// Fill price
    pub fn price(&self) -> Option<Decimal> {
        parse_decimal(&self.price)
    }

    /// Filled amount
    pub fn amount(&self) -> Option<Decimal> {
        parse_decimal(&self.amount)
    }
}

/// Paginated user trades
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTradesResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub trades: Vec<UserTrade>,
    #[serde(default)]
    pub has_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::encode_query;
    use rust_decimal_macros::dec;

    #[test]
    fn test_login_request_wire_shape() {
        let body = LoginRequest {
            username: "me@example.com",
            password: "hunter2",
            captcha: "api",
            remember: RememberMode::ShortLived,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"username":"me@example.com","password":"hunter2","captcha":"api","remember":"no"}"#
        );
        assert!(!format!("{:?}", body).contains("hunter2"));
    }

    #[test]
    fn test_login_response_hides_key() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"status":"success","key":"secret-key","device":"d"}"#).unwrap();
        assert_eq!(response.key, "secret-key");
        assert!(!format!("{:?}", response).contains("secret-key"));
    }

    #[test]
    fn test_orderbook_helpers() {
        let book: OrderBook = serde_json::from_str(
            r#"{"status":"ok","lastUpdate":1700000000000,"lastTradePrice":"101",
                "asks":[["102","1.5"],["103","2"]],"bids":[["100","0.5"],["99","3"]]}"#,
        )
        .unwrap();
        assert_eq!(book.best_ask(), Some(dec!(102)));
        assert_eq!(book.best_bid(), Some(dec!(100)));
        assert_eq!(book.spread(), Some(dec!(2)));
        assert_eq!(book.mid_price(), Some(dec!(101)));

        let empty: OrderBook = serde_json::from_str(r#"{"asks":[],"bids":[]}"#).unwrap();
        assert!(empty.spread().is_none());
    }

    #[test]
    fn test_ticker_parsing() {
        let tickers: TickersResponse = serde_json::from_str(
            r#"{"status":"ok","stats":{"btc-rls":{"isClosed":false,"bestSell":"5010","bestBuy":"5000",
                "latest":"5005","dayChange":1.25}}}"#,
        )
        .unwrap();
        let ticker = tickers.get("BTC", "RLS").unwrap();
        assert_eq!(ticker.spread(), Some(dec!(10)));
        assert_eq!(ticker.last_price(), Some(dec!(5005)));
        assert_eq!(ticker.day_change, "1.25");
        assert!(ticker.mark.is_empty());
    }

    #[test]
    fn test_wallets_query_joins_currencies() {
        let params = WalletsParams::new()
            .with_currencies(["btc", "usdt"])
            .with_trade_type("spot");
        assert_eq!(encode_query(&params).unwrap(), "currencies=btc%2Cusdt&type=spot");
        assert_eq!(encode_query(&WalletsParams::new()).unwrap(), "");
    }

    #[test]
    fn test_wallet_available_balance() {
        let wallet: Wallet =
            serde_json::from_str(r#"{"id":1,"balance":"10.5","blocked":"0.5"}"#).unwrap();
        assert_eq!(wallet.available(), Some(dec!(10.0)));
    }

    #[test]
    fn test_create_order_body() {
        let order = CreateOrderParams::limit("btc", "usdt", OrderSide::Buy, dec!(0.01), dec!(65000))
            .with_client_order_id("my-1");
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "execution": "limit",
                "srcCurrency": "btc",
                "dstCurrency": "usdt",
                "type": "buy",
                "amount": "0.01",
                "price": "65000",
                "clientOrderId": "my-1"
            })
        );

        let stop = CreateOrderParams::stop_limit("btc", "rls", OrderSide::Sell, dec!(1), dec!(90), dec!(89));
        let json = serde_json::to_value(&stop).unwrap();
        assert_eq!(json["execution"], "stop_limit");
        assert_eq!(json["stopPrice"], "90");
    }

    #[test]
    fn test_cancel_params_force_canceled_status() {
        let json = serde_json::to_value(CancelOrderParams::by_id(42)).unwrap();
        assert_eq!(json, serde_json::json!({"id": 42, "status": "canceled"}));

        let json = serde_json::to_value(CancelOrderParams::by_client_order_id("c1")).unwrap();
        assert_eq!(json, serde_json::json!({"clientOrderId": "c1", "status": "canceled"}));
    }

    #[test]
    fn test_orders_list_query() {
        let params = OrdersListParams::new().for_market("btc", "rls").with_status("open");
        assert_eq!(
            encode_query(&params).unwrap(),
            "status=open&srcCurrency=btc&dstCurrency=rls"
        );
    }

    #[test]
    fn test_order_detail_parsing() {
        let response: OrderResponse = serde_json::from_str(
            r#"{"status":"ok","order":{"id":25,"type":"buy","srcCurrency":"btc","dstCurrency":"rls",
                "price":"520000000","amount":"0.01","matchedAmount":0,"unmatchedAmount":"0.01",
                "status":"Active","created_at":"2018-11-28T11:36:13.592827+00:00"}}"#,
        )
        .unwrap();
        assert_eq!(response.order.side, OrderSide::Buy);
        assert_eq!(response.order.matched_amount(), Some(Decimal::ZERO));
        assert!(response.order.is_open());
        assert!(response.order.created_at.is_some());
    }

    #[test]
    fn test_status_response() {
        let ack: StatusResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(ack.is_ok());
    }
}
