use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use fraud_engine::{
    AuthoritativeTransaction, DecisionEngine, FraudDataProvider, HistoryRecord,
    InMemoryFraudDataProvider, InMemoryTransactionAuthority, PaymentChannel,
    PaymentChannelValidator, PaymentLinkValidator, Reputation, RuleCatalog,
};
use fraud_service::{
    handlers, metrics,
    middleware::{ApiKeyAuth, RateLimiter},
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;

const API_KEY: &str = "test-key";

struct FailingProvider;

#[async_trait]
impl FraudDataProvider for FailingProvider {
    async fn transaction_history(
        &self,
        _customer_id: &str,
        _lookback: chrono::Duration,
    ) -> fraud_engine::Result<Vec<HistoryRecord>> {
        Err(fraud_engine::Error::DataUnavailable("history store down".to_string()))
    }

    async fn ip_reputation(&self, _address: &str) -> fraud_engine::Result<Option<Reputation>> {
        Err(fraud_engine::Error::DataUnavailable("reputation store down".to_string()))
    }

    async fn device_reputation(
        &self,
        _device_id: &str,
    ) -> fraud_engine::Result<Option<Reputation>> {
        Err(fraud_engine::Error::DataUnavailable("reputation store down".to_string()))
    }
}

fn original_transaction() -> AuthoritativeTransaction {
    AuthoritativeTransaction {
        id: 1,
        reference: "KP-REF-001".to_string(),
        merchant_id: 42,
        customer_email: "ada@example.com".to_string(),
        customer_id: 7,
        customer_name: None,
        amount: 500000,
        currency: "NGN".to_string(),
        status: "pending".to_string(),
        description: None,
        created_at: None,
    }
}

fn state_with_provider(provider: Arc<dyn FraudDataProvider>) -> AppState {
    let engine = DecisionEngine::new(Arc::new(RuleCatalog::default_rules()), provider);

    let authority = Arc::new(InMemoryTransactionAuthority::new());
    authority.insert(original_transaction());

    let link_validator = PaymentLinkValidator::new(authority.clone());
    let channel_validator = PaymentChannelValidator::new()
        .with_flagged(PaymentChannel::BankTransfer, "fraud_bank_txn_456");

    AppState::new(engine, authority, link_validator, channel_validator)
}

fn state() -> AppState {
    state_with_provider(Arc::new(InMemoryFraudDataProvider::new()))
}

macro_rules! app {
    ($state:expr) => {
        app!($state, 100)
    };
    ($state:expr, $rps:expr) => {{
        let limiter = RateLimiter::per_second($rps);
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .wrap(ApiKeyAuth::new(API_KEY))
                .configure(move |cfg| handlers::configure_routes(cfg, limiter)),
        )
        .await
    }};
}

// Middleware rejections surface as service errors; render them like the server does.
macro_rules! call {
    ($app:expr, $req:expr) => {{
        match test::try_call_service(&$app, $req.to_request()).await {
            Ok(resp) => {
                let status = resp.status();
                (status, test::read_body(resp).await)
            }
            Err(err) => {
                let resp = err.error_response();
                let status = resp.status();
                let body = actix_web::body::to_bytes(resp.into_body())
                    .await
                    .unwrap_or_default();
                (status, body)
            }
        }
    }};
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn check(body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/fraud/check-transaction")
        .insert_header(("X-API-Key", API_KEY))
        .set_json(body)
}

#[actix_web::test]
async fn test_health_needs_no_api_key() {
    let app = app!(state());
    let (status, body) = call!(app, test::TestRequest::get().uri("/health"));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["status"], "healthy");
}

#[actix_web::test]
async fn test_missing_api_key_rejected() {
    let app = app!(state());
    let req = test::TestRequest::post()
        .uri("/fraud/check-transaction")
        .set_json(json!({"customer_id": "c1", "amount": 10.0, "currency": "NGN"}));
    let (status, body) = call!(app, req);

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body = json_body(&body);
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "API key missing");
}

#[actix_web::test]
async fn test_wrong_api_key_rejected() {
    let app = app!(state());
    let req = test::TestRequest::get()
        .uri("/fraud/rules")
        .insert_header(("X-API-Key", "nope"));
    let (status, body) = call!(app, req);

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["message"], "Invalid API key");
}

#[actix_web::test]
async fn test_high_amount_from_suspicious_origin_is_denied() {
    let app = app!(state());
    let (status, body) = call!(
        app,
        check(json!({
            "customer_id": "cust_123",
            "amount": 1500.0,
            "currency": "NGN",
            "origin": "suspicious_ip"
        }))
    );

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["decision"], "deny");
    assert_eq!(body["overall_score"], 120.0);
    assert_eq!(
        body["reasons"],
        json!([
            "Flags transactions with amounts exceeding a high threshold.",
            "Flags transactions originating from suspicious IP addresses."
        ])
    );
}

#[actix_web::test]
async fn test_high_amount_alone_is_flagged() {
    let app = app!(state());
    let (status, body) = call!(
        app,
        check(json!({"customer_id": "cust_123", "amount": 1500.0, "currency": "NGN"}))
    );

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["decision"], "flag");
    assert_eq!(body["overall_score"], 50.0);
}

#[actix_web::test]
async fn test_mistyped_optional_fields_do_not_apply() {
    let app = app!(state());
    let (status, body) = call!(
        app,
        check(json!({
            "customer_id": "c1",
            "amount": 1500.0,
            "currency": "NGN",
            "origin": 42,
            "device_id": 7
        }))
    );

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["decision"], "flag");
    assert_eq!(body["overall_score"], 50.0);
    assert_eq!(
        body["reasons"],
        json!(["Flags transactions with amounts exceeding a high threshold."])
    );
}

#[actix_web::test]
async fn test_clean_transaction_is_approved() {
    let app = app!(state());
    let (status, body) = call!(
        app,
        check(json!({"customer_id": "cust_123", "amount": 20.0, "currency": "NGN"}))
    );

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["decision"], "approve");
    assert_eq!(body["overall_score"], 0.0);
    assert_eq!(body["reasons"], json!([]));
}

#[actix_web::test]
async fn test_invalid_transaction_body_rejected() {
    let app = app!(state());
    let (status, body) = call!(
        app,
        check(json!({"customer_id": "cust_123", "amount": -3.0, "currency": "NGN"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json_body(&body);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("amount is required and must be a positive number"));

    let (status, body) = call!(app, check(json!({"customer_id": "cust_123"})));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_unavailable_fraud_data_is_503() {
    let app = app!(state_with_provider(Arc::new(FailingProvider)));
    let (status, body) = call!(
        app,
        check(json!({"customer_id": "cust_123", "amount": 20.0, "currency": "NGN"}))
    );

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(&body)["error"], "DATA_UNAVAILABLE");
}

#[actix_web::test]
async fn test_payment_link_checks() {
    let app = app!(state());
    let track = |url: &str| {
        test::TestRequest::post()
            .uri("/fraud/track-payment-link")
            .insert_header(("X-API-Key", API_KEY))
            .set_json(json!({ "url": url }))
    };

    let (status, body) = call!(
        app,
        track("https://pay.kodra.com/l?ref=KP-REF-001&merchant_id=42&amount=500000&currency=NGN")
    );
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["is_suspicious"], false);
    assert_eq!(body["reason"], "payment link is legitimate");

    let (_, body) = call!(
        app,
        track("https://pay.kodra.com/l?ref=KP-REF-001&merchant_id=42&amount=100&currency=NGN")
    );
    let body = json_body(&body);
    assert_eq!(body["is_suspicious"], true);
    assert_eq!(
        body["reason"],
        "amount mismatch: link has 100, original has 500000"
    );

    let (_, body) = call!(
        app,
        track("https://pay.kodra.com/l?ref=UNKNOWN&merchant_id=42&amount=500000&currency=NGN")
    );
    assert_eq!(
        json_body(&body)["reason"],
        "transaction reference UNKNOWN not found for payment link"
    );

    let (status, _) = call!(app, track(""));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_transaction_details_proxy() {
    let app = app!(state());
    let get = |reference: &str| {
        test::TestRequest::get()
            .uri(&format!("/fraud/transactions/{}", reference))
            .insert_header(("X-API-Key", API_KEY))
    };

    let (status, body) = call!(app, get("KP-REF-001"));
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["merchant_id"], 42);
    assert_eq!(body["amount"], 500000);

    let (status, body) = call!(app, get("missing"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["error"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_payment_channel_checks() {
    let app = app!(state());
    let validate = |channel: &str, id: &str| {
        test::TestRequest::post()
            .uri("/fraud/validate-payment-channel")
            .insert_header(("X-API-Key", API_KEY))
            .set_json(json!({ "channel_type": channel, "transaction_id": id }))
    };

    let (status, body) = call!(app, validate("bank_transfer", "fraud_bank_txn_456"));
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["is_valid"], false);
    assert_eq!(
        body["reason"],
        "transaction fraud_bank_txn_456 via bank transfer is fraudulent"
    );

    let (_, body) = call!(app, validate("credit_card", "card_txn_1"));
    assert_eq!(json_body(&body)["is_valid"], true);

    let (_, body) = call!(app, validate("crypto", "x1"));
    let body = json_body(&body);
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["reason"], "unsupported or unknown payment channel: crypto");

    let (status, _) = call!(app, validate("", "x1"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_rules_listing_keeps_catalog_order() {
    let app = app!(state());
    let req = test::TestRequest::get()
        .uri("/fraud/rules")
        .insert_header(("X-API-Key", API_KEY));
    let (status, body) = call!(app, req);

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = json_body(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|rule| rule["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        ids,
        vec![
            "HIGH_AMOUNT_TRANSACTION",
            "SUSPICIOUS_IP_ORIGIN",
            "HIGH_VELOCITY_CUSTOMER",
            "BLACKLISTED_DEVICE"
        ]
    );
}

#[actix_web::test]
async fn test_rate_limit_applies_to_fraud_routes_only() {
    let app = app!(state(), 1);
    let rules = || {
        test::TestRequest::get()
            .uri("/fraud/rules")
            .insert_header(("X-API-Key", API_KEY))
    };

    let (status, _) = call!(app, rules());
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call!(app, rules());
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(&body)["error"], "RATE_LIMITED");

    let (status, _) = call!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_metrics_endpoint_requires_key() {
    metrics::init();
    let app = app!(state());

    let (status, _) = call!(app, test::TestRequest::get().uri("/metrics"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let _ = call!(
        app,
        check(json!({"customer_id": "cust_9", "amount": 5.0, "currency": "NGN"}))
    );
    let req = test::TestRequest::get()
        .uri("/metrics")
        .insert_header(("X-API-Key", API_KEY));
    let (status, body) = call!(app, req);
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("fraud_decisions_total"));
}
