//! Demo 1: Market Snapshot
//!
//! Showcases: Public endpoints, decimal-precise orderbook helpers
//!
//! Run: cargo run --bin market_snapshot -- BTCIRT

use colored::*;
use nobitex_rest::{NobitexClient, TickersParams};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "BTCIRT".to_string());

    println!("{}", "═".repeat(60).cyan());
    println!("{}", format!("  MARKET SNAPSHOT: {}", symbol).cyan().bold());
    println!("{}", "═".repeat(60).cyan());
    println!();

    let client = NobitexClient::new()?;

    let options = client.get_options().await?;
    println!(
        "{} {} active currencies",
        "✓".green(),
        options.nobitex.active_currencies.len()
    );

    let book = client.get_orderbook(&symbol).await?;
    match (book.best_bid(), book.best_ask(), book.spread()) {
        (Some(bid), Some(ask), Some(spread)) => {
            println!("  {} {}", "BID:".yellow(), bid);
            println!("  {} {}", "ASK:".yellow(), ask);
            println!("  {} {}", "SPREAD:".green(), spread);
            if let Some(mid) = book.mid_price() {
                if !mid.is_zero() {
                    let bps = spread / mid * Decimal::from(10_000);
                    println!("  {} {:.2}", "BPS:".green(), bps);
                }
            }
        }
        _ => println!("  {}", "Orderbook is empty".red()),
    }
    println!();

    let trades = client.get_recent_trades(&symbol).await?;
    println!("{}", "Recent trades".bold());
    for trade in trades.trades.iter().take(10) {
        let side = match trade.side {
            nobitex_rest::OrderSide::Buy => "BUY ".green(),
            nobitex_rest::OrderSide::Sell => "SELL".red(),
        };
        println!("  {} {:>20} x {}", side, trade.price, trade.volume);
    }
    println!();

    let (src, dst) = split_symbol(&symbol);
    let src = src.to_lowercase();
    let tickers = client.get_tickers(&TickersParams::new(&src, dst)).await?;
    if let Some(ticker) = tickers.get(&src, dst) {
        println!(
            "{} last {}  ({} ticker)",
            "✓".green(),
            ticker.last_price().map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            format!("{}-{}", src, dst).dimmed()
        );
    }

    Ok(())
}

/// `BTCIRT` -> (`btc`, `rls`), `ETHUSDT` -> (`eth`, `usdt`)
fn split_symbol(symbol: &str) -> (&str, &str) {
    let len = symbol.len();
    if symbol.ends_with("USDT") {
        (&symbol[..len - 4], "usdt")
    } else if symbol.ends_with("IRT") {
        (&symbol[..len - 3], "rls")
    } else {
        (symbol, "rls")
    }
}
