use fraud_engine::{ChannelEvent, TransactionEvent};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Move an optional rule field out of the extension map when it has the
/// expected type. Mistyped values stay in the map and the field is absent.
fn take_typed<T: DeserializeOwned>(extra: &mut Map<String, Value>, key: &str) -> Option<T> {
    let typed = serde_json::from_value(extra.get(key)?.clone()).ok()?;
    extra.remove(key);
    Some(typed)
}

// ===== Check Transaction =====
/// Only the three mandatory fields are typed; `origin`, `device_id`,
/// `merchant_id` and anything else arrive through `extra`
#[derive(Debug, Deserialize, Clone, Validate)]
#[validate(schema(function = "validate_positive_amount", skip_on_field_errors = false))]
pub struct CheckTransactionRequest {
    #[validate(length(min = 1, message = "customer_id is required and must be a string"))]
    pub customer_id: String,
    pub amount: f64,
    #[validate(length(min = 1, message = "currency is required and must be a string"))]
    pub currency: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn validate_positive_amount(req: &CheckTransactionRequest) -> Result<(), ValidationError> {
    if req.amount.is_finite() && req.amount > 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive_amount");
        err.message = Some("amount is required and must be a positive number".into());
        Err(err)
    }
}

impl From<CheckTransactionRequest> for TransactionEvent {
    fn from(req: CheckTransactionRequest) -> Self {
        let mut extra = req.extra;
        TransactionEvent {
            customer_id: Some(req.customer_id),
            amount: Some(req.amount),
            currency: Some(req.currency),
            origin: take_typed(&mut extra, "origin"),
            device_id: take_typed(&mut extra, "device_id"),
            merchant_id: take_typed(&mut extra, "merchant_id"),
            extra,
        }
    }
}

// ===== Track Payment Link =====
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct TrackPaymentLinkRequest {
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackPaymentLinkResponse {
    pub is_suspicious: bool,
    pub reason: String,
}

// ===== Validate Payment Channel =====
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ValidatePaymentChannelRequest {
    #[validate(length(min = 1, message = "channel_type is required and must be a string"))]
    pub channel_type: String,
    #[validate(length(min = 1, message = "transaction_id is required and must be a string"))]
    pub transaction_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<ValidatePaymentChannelRequest> for ChannelEvent {
    fn from(req: ValidatePaymentChannelRequest) -> Self {
        let mut extra = req.extra;
        ChannelEvent {
            channel_type: req.channel_type,
            transaction_id: req.transaction_id,
            customer_id: take_typed(&mut extra, "customer_id"),
            amount: take_typed(&mut extra, "amount"),
            currency: take_typed(&mut extra, "currency"),
            origin: take_typed(&mut extra, "origin"),
            device_id: take_typed(&mut extra, "device_id"),
            extra,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidatePaymentChannelResponse {
    pub is_valid: bool,
    pub reason: String,
}

// ===== Health Check =====
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

// ===== Error Response =====
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
