//! Demo 2: Wallet Balances
//!
//! Showcases: Login with TOTP, automatic key refresh, private endpoints
//!
//! Requires NOBITEX_USERNAME, NOBITEX_PASSWORD, NOBITEX_OTP_SECRET and
//! NOBITEX_USER_AGENT in the environment.
//!
//! Run: cargo run --bin wallet_balances

use colored::*;
use nobitex_rest::{ClientBuilder, OrdersListParams, WalletsParams};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("{}", "═".repeat(60).cyan());
    println!("{}", "  WALLET BALANCES".cyan().bold());
    println!("{}", "═".repeat(60).cyan());
    println!();

    let client = ClientBuilder::from_env().connect().await?;
    if !client.is_authenticated() {
        println!("{} Not logged in; check credentials", "✗".red());
        return Ok(());
    }
    println!("{} Logged in ({})", "✓".green(), client.session().remember());

    let wallets = client.get_wallets(&WalletsParams::new()).await?;
    let mut balances: Vec<_> = wallets.non_zero().into_iter().collect();
    balances.sort_by(|a, b| a.0.cmp(b.0));

    if balances.is_empty() {
        println!("  {}", "No funded wallets".dimmed());
    }
    for (currency, balance) in balances {
        println!("  {:>8} {}", currency.to_uppercase().yellow(), balance);
    }
    println!();

    match client.get_open_orders(&OrdersListParams::new()).await {
        Ok(orders) => println!("{} {} open orders", "✓".green(), orders.orders.len()),
        Err(e) => println!("{} Could not list orders: {}", "✗".red(), e),
    }

    Ok(())
}
