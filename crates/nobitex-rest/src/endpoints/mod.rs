//! API endpoint implementations

use std::time::Duration;

use serde::Serialize;

use crate::request::Request;

pub mod account;
pub mod market;
pub mod trading;

pub use account::AccountEndpoints;
pub use market::MarketEndpoints;
pub use trading::TradingEndpoints;

/// Apply an endpoint group's per-call timeout, if it has one
fn bounded<'b, B: Serialize + ?Sized>(request: Request<'b, B>, timeout: Option<Duration>) -> Request<'b, B> {
    match timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    }
}
