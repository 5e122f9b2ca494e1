use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use fraud_engine::{ChannelEvent, Event, TransactionEvent};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::errors::{FraudResult, FraudServiceError};
use crate::metrics::{
    self, FRAUD_DECISIONS_TOTAL, FRAUD_EVALUATION_DURATION, FRAUD_EVALUATION_FAILURES_TOTAL,
    PAYMENT_CHANNEL_CHECKS_TOTAL, PAYMENT_LINK_CHECKS_TOTAL,
};
use crate::middleware::RateLimiter;
use crate::models::*;
use crate::AppState;

// ===== Health Check =====
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

// ===== Prometheus Metrics =====
pub async fn metrics_endpoint() -> FraudResult<HttpResponse> {
    let body = metrics::render().map_err(|e| FraudServiceError::InternalError(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ===== Check Transaction =====
pub async fn check_transaction(
    req: web::Json<CheckTransactionRequest>,
    state: web::Data<AppState>,
) -> FraudResult<HttpResponse> {
    let request = req.into_inner();
    request.validate().map_err(validation_error)?;

    let request_id = Uuid::new_v4();
    let customer_id = request.customer_id.clone();
    let event = Event::from(TransactionEvent::from(request));

    let timer = FRAUD_EVALUATION_DURATION.start_timer();
    let outcome = state.engine.evaluate(&event).await;
    timer.observe_duration();

    match outcome {
        Ok(decision) => {
            FRAUD_DECISIONS_TOTAL
                .with_label_values(&[decision.decision.as_str()])
                .inc();
            info!(
                %request_id,
                customer_id = %customer_id,
                decision = %decision.decision,
                score = decision.overall_score,
                "Transaction checked"
            );
            Ok(HttpResponse::Ok().json(decision))
        }
        Err(e) => {
            let kind = match &e {
                fraud_engine::Error::RuleEvaluation { .. } => "rule_evaluation",
                fraud_engine::Error::DataUnavailable(_) => "data_unavailable",
                fraud_engine::Error::InvalidConfig(_) => "invalid_config",
            };
            FRAUD_EVALUATION_FAILURES_TOTAL.with_label_values(&[kind]).inc();
            error!(%request_id, customer_id = %customer_id, "Fraud evaluation failed: {}", e);
            Err(e.into())
        }
    }
}

// ===== Track Payment Link =====
pub async fn track_payment_link(
    req: web::Json<TrackPaymentLinkRequest>,
    state: web::Data<AppState>,
) -> FraudResult<HttpResponse> {
    let request = req.into_inner();
    request.validate().map_err(validation_error)?;

    let verdict = state.link_validator.validate_link(&request.url).await;

    let outcome = if verdict.is_suspicious {
        warn!("Suspicious payment link: {}", verdict.reason);
        "suspicious"
    } else {
        "legitimate"
    };
    PAYMENT_LINK_CHECKS_TOTAL.with_label_values(&[outcome]).inc();

    Ok(HttpResponse::Ok().json(TrackPaymentLinkResponse {
        is_suspicious: verdict.is_suspicious,
        reason: verdict.reason,
    }))
}

// ===== Validate Payment Channel =====
pub async fn validate_payment_channel(
    req: web::Json<ValidatePaymentChannelRequest>,
    state: web::Data<AppState>,
) -> FraudResult<HttpResponse> {
    let request = req.into_inner();
    request.validate().map_err(validation_error)?;

    let event = ChannelEvent::from(request);
    let verdict = state.channel_validator.validate(&event);

    let outcome = if verdict.is_valid { "valid" } else { "invalid" };
    PAYMENT_CHANNEL_CHECKS_TOTAL.with_label_values(&[outcome]).inc();
    info!(
        channel = %event.channel_type,
        transaction_id = %event.transaction_id,
        outcome,
        "Payment channel checked"
    );

    Ok(HttpResponse::Ok().json(ValidatePaymentChannelResponse {
        is_valid: verdict.is_valid,
        reason: verdict.reason,
    }))
}

// ===== Get Transaction Details =====
pub async fn get_transaction_details(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> FraudResult<HttpResponse> {
    let reference = path.into_inner();
    let transaction = state.authority.transaction_by_reference(&reference).await?;
    Ok(HttpResponse::Ok().json(transaction))
}

// ===== List Rules =====
pub async fn list_rules(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.engine.catalog())
}

/// Malformed JSON bodies become 400s with the usual error envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        FraudServiceError::ValidationError(err.to_string()).into()
    })
}

fn validation_error(errors: ValidationErrors) -> FraudServiceError {
    FraudServiceError::ValidationError(describe_validation_errors(&errors))
}

/// Flatten field errors into one message, ordered by field name
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: RateLimiter) {
    cfg.app_data(json_config())
        .service(
            web::scope("/fraud")
                .wrap(limiter)
                .route("/check-transaction", web::post().to(check_transaction))
                .route("/track-payment-link", web::post().to(track_payment_link))
                .route(
                    "/validate-payment-channel",
                    web::post().to(validate_payment_channel),
                )
                .route(
                    "/transactions/{reference}",
                    web::get().to(get_transaction_details),
                )
                .route("/rules", web::get().to(list_rules)),
        )
        .route("/metrics", web::get().to(metrics_endpoint))
        .route("/health", web::get().to(health_check));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_validation_errors() {
        let req: CheckTransactionRequest = serde_json::from_value(json!({
            "customer_id": "",
            "amount": -5.0,
            "currency": ""
        }))
        .unwrap();
        let message = describe_validation_errors(&req.validate().unwrap_err());
        assert_eq!(
            message,
            "amount is required and must be a positive number; \
             currency is required and must be a string; \
             customer_id is required and must be a string"
        );
    }
}
