//! End-to-end tests against a fake exchange served by wiremock

mod common;

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use common::*;
use nobitex_rest::{
    CancelOrderParams, CreateOrderParams, NobitexClient, OrderSide, OrdersListParams, RememberMode,
    RestError, Session, WalletsParams,
};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .and(header("X-TOTP", TEST_OTP))
        .and(header("User-Agent", "TraderBot/it-bot/0.1"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_RESPONSE))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_public_orderbook() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/orderbook/BTCIRT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ORDERBOOK_RESPONSE))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server).build().unwrap();
    let book = client.get_orderbook("BTCIRT").await.unwrap();

    assert_eq!(book.best_ask(), Some(dec!(2150100000)));
    assert_eq!(book.best_bid(), Some(dec!(2149900000)));
    assert_eq!(book.spread(), Some(dec!(200000)));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_then_wallets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .and(body_json(json!({
            "username": "trader@example.com",
            "password": "correct horse",
            "captcha": "api",
            "remember": "yes"
        })))
        .and(header("X-TOTP", TEST_OTP))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_RESPONSE))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/wallets"))
        .and(query_param("currencies", "btc,rls"))
        .and(header("Authorization", "Token it-key"))
        .and(header("User-Agent", "TraderBot/it-bot/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(WALLETS_RESPONSE))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server)
        .with_credentials(credentials())
        .with_remember(RememberMode::LongLived)
        .connect()
        .await
        .unwrap();
    assert!(client.is_authenticated());

    let wallets = client
        .get_wallets(&WalletsParams::new().with_currencies(["btc", "rls"]))
        .await
        .unwrap();
    assert_eq!(wallets.wallets["btc"].available(), Some(dec!(0.20)));
    assert_eq!(wallets.non_zero().len(), 1);
}

#[tokio::test]
async fn test_rejected_login_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"status":"failed","detail":"invalid credentials"}"#),
        )
        .mount(&server)
        .await;

    let err = builder(&server)
        .with_credentials(credentials())
        .connect()
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    let api = err.api_error().unwrap();
    assert_eq!(api.message, "invalid credentials");
    assert_eq!(api.status.as_deref(), Some("failed"));
}

#[tokio::test]
async fn test_missing_user_agent_never_reaches_server() {
    let server = MockServer::start().await;

    let client = NobitexClient::builder()
        .with_base_url(server.uri())
        .with_api_key("it-key")
        .build()
        .unwrap();

    let err = client.get_wallets(&WalletsParams::new()).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_order_errors_are_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/market/orders/add"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"status":"failed","code":"InvalidOrderPrice","message":"Order price is not valid","badFields":["price","amount"]}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/market/orders/list"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = builder(&server).with_api_key("it-key").build().unwrap();

    let order = CreateOrderParams::limit("btc", "rls", OrderSide::Buy, dec!(0.01), dec!(1));
    let err = client.create_order(&order).await.unwrap_err();
    let api = err.api_error().unwrap();
    assert_eq!(api.status_code, 400);
    assert_eq!(api.code.as_deref(), Some("InvalidOrderPrice"));
    assert_eq!(api.message, "Order price is not valid");
    assert_eq!(api.field("badFields").unwrap().values(), vec!["price", "amount"]);

    let err = client
        .get_orders_history(&OrdersListParams::new())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(502));
    assert_eq!(err.api_error().unwrap().message, "API error (502)");
}

#[tokio::test]
async fn test_repeated_cancel_is_acknowledged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/market/orders/update-status"))
        .and(body_json(json!({"id": 5, "status": "canceled"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(OK_RESPONSE))
        .expect(2)
        .mount(&server)
        .await;

    let client = builder(&server).with_api_key("it-key").build().unwrap();
    let params = CancelOrderParams::by_id(5);

    let first = client.cancel_order(&params).await.unwrap();
    let second = client.cancel_order(&params).await.unwrap();
    assert!(first.is_ok());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_open_orders_forces_status_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/market/orders/list"))
        .and(query_param("status", "open"))
        .and(query_param("srcCurrency", "btc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok","orders":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server).with_api_key("it-key").build().unwrap();
    let params = OrdersListParams::new().with_status("done").for_market("btc", "rls");

    let orders = client.get_open_orders(&params).await.unwrap();
    assert!(orders.orders.is_empty());
}

#[tokio::test]
async fn test_stale_key_refreshed_once_for_concurrent_calls() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v2/wallets"))
        .and(header("Authorization", "Token it-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(WALLETS_RESPONSE))
        .expect(2)
        .mount(&server)
        .await;

    let client = builder(&server)
        .with_credentials(credentials())
        .with_remember(RememberMode::ShortLived)
        .build()
        .unwrap();
    client.sessions().set_session(Session::issued_at(
        "expired-key",
        RememberMode::ShortLived,
        Utc::now() - ChronoDuration::hours(4) - ChronoDuration::minutes(1),
    ));

    let params = WalletsParams::new();
    let (a, b) = tokio::join!(client.get_wallets(&params), client.get_wallets(&params));
    a.unwrap();
    b.unwrap();

    assert_eq!(client.session().key(), "it-key");
}

#[tokio::test]
async fn test_refresh_failure_is_shared() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string(r#"{"status":"failed","message":"rate limited"}"#)
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server).with_credentials(credentials()).build().unwrap();
    client.sessions().set_session(Session::issued_at(
        "expired-key",
        RememberMode::Unspecified,
        Utc::now() - ChronoDuration::hours(5),
    ));

    let params = WalletsParams::new();
    let (a, b) = tokio::join!(client.get_wallets(&params), client.get_wallets(&params));
    for result in [a, b] {
        let err = result.unwrap_err();
        assert!(matches!(err, RestError::RefreshFailed(_)));
        assert!(err.is_rate_limited());
    }
}

#[tokio::test]
async fn test_per_call_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/options"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"nobitex":{}}"#)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = builder(&server).build().unwrap();
    let started = std::time::Instant::now();

    let err = client
        .market()
        .with_timeout(Duration::from_millis(100))
        .get_options()
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(4));
}
