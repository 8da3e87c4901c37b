//! Integration tests driving [`TradingClient`] against a mock brokerage.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trading_client::broker::{
    BrokerConfig, BrokerError, FreshnessCheck, OrderTicket, RetryPolicy, TradingClient,
    TradingMode,
};

fn account_body() -> serde_json::Value {
    json!({
        "id": "test-account",
        "status": "ACTIVE",
        "equity": "100000",
        "cash": "40000",
        "buying_power": "80000",
        "portfolio_value": "100000"
    })
}

fn clock_body(is_open: bool) -> serde_json::Value {
    json!({
        "timestamp": Utc::now().to_rfc3339(),
        "is_open": is_open,
        "next_open": "2024-06-03T13:30:00Z",
        "next_close": "2024-06-03T20:00:00Z"
    })
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(40),
        jitter: 0.1,
        min_delay: Duration::from_millis(1),
    }
}

fn test_config(server: &MockServer) -> BrokerConfig {
    BrokerConfig::new("test-key".into(), "test-secret".into(), TradingMode::Paper)
        .with_base_url(&server.uri())
        .with_retry(fast_retry())
}

async fn mount_account(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_body()))
        .mount(server)
        .await;
}

async fn connected_client(server: &MockServer) -> TradingClient {
    mount_account(server).await;
    TradingClient::connect(test_config(server))
        .await
        .expect("client should connect")
}

#[tokio::test]
async fn connect_validates_account_and_sends_auth_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .and(wiremock::matchers::header("APCA-API-KEY-ID", "test-key"))
        .and(wiremock::matchers::header("APCA-API-SECRET-KEY", "test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = TradingClient::connect(test_config(&server)).await.unwrap();
    assert!(!client.is_live());
}

#[tokio::test]
async fn connect_fails_fast_on_rejected_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/account"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "access key verification failed"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = TradingClient::connect(test_config(&server)).await.unwrap_err();
    assert!(matches!(err, BrokerError::AuthenticationFailed));
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    // Two 500s, then success. The retry loop must absorb both failures.
    Mock::given(method("GET"))
        .and(path("/v2/clock"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "internal server error"})),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/clock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clock_body(true)))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.is_market_open().await.unwrap());
}

#[tokio::test]
async fn server_errors_surface_after_retries_exhaust() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2/clock"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "service unavailable"})),
        )
        // Initial attempt plus three retries.
        .expect(4)
        .mount(&server)
        .await;

    let err = client.is_market_open().await.unwrap_err();
    assert!(matches!(err, BrokerError::Server { status: 503, .. }));
}

#[tokio::test]
async fn client_errors_fail_immediately_without_retry() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2/orders/missing-id"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "order not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.order("missing-id").await.unwrap_err();
    match err {
        BrokerError::Client { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("order not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_position_is_a_sentinel_not_an_error() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2/positions/AAPL"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 40_410_000,
            "message": "position does not exist"
        })))
        .expect(2)
        .mount(&server)
        .await;

    // Idempotent: both calls hit the server and both report no position.
    assert!(!client.has_position("AAPL").await.unwrap());
    assert!(!client.has_position("AAPL").await.unwrap());
}

#[tokio::test]
async fn other_404s_on_positions_propagate() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2/positions/NOPE"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "asset not found"})),
        )
        .mount(&server)
        .await;

    let err = client.has_position("NOPE").await.unwrap_err();
    assert!(matches!(err, BrokerError::Client { status: 404, .. }));
}

#[tokio::test]
async fn invalid_order_never_reaches_the_wire() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Both qty and notional.
    let ticket = OrderTicket::market_buy("AAPL", dec!(10)).with_notional(dec!(1000));
    let err = client.place_order(&ticket).await.unwrap_err();
    assert!(matches!(err, BrokerError::InvalidOrder(_)));

    // Neither qty nor notional.
    let ticket = OrderTicket::new(
        "AAPL",
        trading_client::broker::OrderSide::Buy,
        trading_client::broker::OrderType::Market,
    );
    let err = client.place_order(&ticket).await.unwrap_err();
    assert!(matches!(err, BrokerError::InvalidOrder(_)));
}

#[tokio::test]
async fn valid_order_posts_and_parses_the_ack() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "broker-1",
            "client_order_id": "client-1",
            "symbol": "AAPL",
            "status": "accepted",
            "side": "buy",
            "type": "limit",
            "time_in_force": "day",
            "qty": "10",
            "limit_price": "150.00",
            "created_at": "2024-06-03T14:00:00Z",
            "submitted_at": "2024-06-03T14:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let order = client.buy_limit("AAPL", dec!(10), dec!(150)).await.unwrap();
    assert_eq!(order.id, "broker-1");
    assert_eq!(order.status, "accepted");
    assert_eq!(order.limit_price, Some(dec!(150.00)));
}

#[tokio::test]
async fn cancel_order_tolerates_empty_body() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/v2/orders/broker-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.cancel_order("broker-1").await.unwrap();
}

fn bars_body(symbol: &str, age: ChronoDuration) -> serde_json::Value {
    let timestamp = (Utc::now() - age).to_rfc3339();
    json!({
        "bars": {
            symbol: [{
                "t": timestamp,
                "o": 150.0, "h": 151.0, "l": 149.0, "c": 150.5, "v": 1_000_000u64
            }]
        },
        "next_page_token": null
    })
}

async fn mount_clock(server: &MockServer, is_open: bool) {
    Mock::given(method("GET"))
        .and(path("/v2/clock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clock_body(is_open)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn stale_bars_are_rejected_while_market_is_open() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;
    mount_clock(&server, true).await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .and(query_param("symbols", "AAPL"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(bars_body("AAPL", ChronoDuration::minutes(10))),
        )
        .mount(&server)
        .await;

    let err = client
        .daily_bars("AAPL", 5, FreshnessCheck::Enforce)
        .await
        .unwrap_err();
    match err {
        BrokerError::StaleData {
            age_minutes,
            threshold_minutes,
            market_open,
            ..
        } => {
            assert_eq!(age_minutes, 10);
            assert_eq!(threshold_minutes, 5);
            assert!(market_open);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn stale_bars_pass_while_market_is_closed() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;
    mount_clock(&server, false).await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(bars_body("AAPL", ChronoDuration::minutes(30))),
        )
        .mount(&server)
        .await;

    // 30 minutes old is within the 60-minute off-hours threshold.
    let bars = client
        .daily_bars("AAPL", 5, FreshnessCheck::Enforce)
        .await
        .unwrap();
    assert_eq!(bars.len(), 1);
}

#[tokio::test]
async fn skipping_validation_still_attaches_metadata() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;
    mount_clock(&server, true).await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(bars_body("AAPL", ChronoDuration::hours(3))),
        )
        .mount(&server)
        .await;

    let data = client
        .bars(
            &trading_client::broker::BarsQuery::daily("AAPL", 5),
            FreshnessCheck::Skip,
        )
        .await
        .unwrap();

    let freshness = data.freshness.expect("metadata should be attached");
    assert!(freshness.is_stale);
    assert_eq!(freshness.threshold_minutes, 5);
    assert!(freshness.age_minutes >= 180);
}

#[tokio::test]
async fn fresh_quotes_carry_freshness_metadata() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;
    mount_clock(&server, true).await;

    let timestamp = (Utc::now() - ChronoDuration::seconds(30)).to_rfc3339();
    Mock::given(method("GET"))
        .and(path("/v2/stocks/quotes/latest"))
        .and(query_param("symbols", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quotes": {
                "AAPL": {"t": timestamp, "ap": 150.30, "as": 100u64, "bp": 150.20, "bs": 200u64}
            }
        })))
        .mount(&server)
        .await;

    let data = client
        .latest_quotes(&["AAPL"], FreshnessCheck::Enforce)
        .await
        .unwrap();

    let freshness = data.freshness.unwrap();
    assert!(!freshness.is_stale);
    assert!(freshness.market_open);
    assert_eq!(data.payload.quotes["AAPL"].mid_price(), dec!(150.25));
}

#[tokio::test]
async fn rate_limited_responses_retry_with_retry_after() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2/clock"))
        .respond_with(
            ResponseTemplate::new(429)
                .append_header("Retry-After", "0")
                .set_body_json(json!({"message": "too many requests"})),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/clock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clock_body(true)))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.is_market_open().await.unwrap());
}
