use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use fraud_engine::AuthorityError;
use std::fmt;

use crate::models::ErrorResponse;

#[derive(Debug)]
pub enum FraudServiceError {
    ValidationError(String),
    Unauthorized(String),
    RateLimited,
    NotFound(String),
    RuleEvaluation(String),
    DataUnavailable(String),
    Upstream(String),
    InternalError(String),
}

impl FraudServiceError {
    fn code(&self) -> &'static str {
        match self {
            FraudServiceError::ValidationError(_) => "VALIDATION_ERROR",
            FraudServiceError::Unauthorized(_) => "UNAUTHORIZED",
            FraudServiceError::RateLimited => "RATE_LIMITED",
            FraudServiceError::NotFound(_) => "NOT_FOUND",
            FraudServiceError::RuleEvaluation(_) => "RULE_EVALUATION_ERROR",
            FraudServiceError::DataUnavailable(_) => "DATA_UNAVAILABLE",
            FraudServiceError::Upstream(_) => "UPSTREAM_ERROR",
            FraudServiceError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for FraudServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FraudServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            FraudServiceError::Unauthorized(msg) => write!(f, "{}", msg),
            FraudServiceError::RateLimited => {
                write!(f, "Rate limit exceeded. Please try again later.")
            }
            FraudServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            FraudServiceError::RuleEvaluation(msg) => write!(f, "{}", msg),
            FraudServiceError::DataUnavailable(msg) => write!(f, "{}", msg),
            FraudServiceError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            FraudServiceError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for FraudServiceError {}

impl ResponseError for FraudServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            FraudServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            FraudServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FraudServiceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            FraudServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            FraudServiceError::RuleEvaluation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FraudServiceError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            FraudServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
            FraudServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        })
    }
}

impl From<fraud_engine::Error> for FraudServiceError {
    fn from(err: fraud_engine::Error) -> Self {
        match err {
            fraud_engine::Error::RuleEvaluation { .. } => {
                FraudServiceError::RuleEvaluation(err.to_string())
            }
            fraud_engine::Error::DataUnavailable(_) => {
                FraudServiceError::DataUnavailable(err.to_string())
            }
            fraud_engine::Error::InvalidConfig(_) => {
                FraudServiceError::InternalError(err.to_string())
            }
        }
    }
}

impl From<AuthorityError> for FraudServiceError {
    fn from(err: AuthorityError) -> Self {
        match err {
            AuthorityError::NotFound(_) => FraudServiceError::NotFound(err.to_string()),
            _ => FraudServiceError::Upstream(err.to_string()),
        }
    }
}

pub type FraudResult<T> = Result<T, FraudServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_status() {
        let unavailable: FraudServiceError =
            fraud_engine::Error::DataUnavailable("redis down".to_string()).into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let rule: FraudServiceError = fraud_engine::Error::RuleEvaluation {
            rule_id: "HIGH_AMOUNT_TRANSACTION".to_string(),
            reason: "amount NaN is not a finite number".to_string(),
        }
        .into();
        assert_eq!(rule.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(rule.to_string().contains("HIGH_AMOUNT_TRANSACTION"));
    }

    #[test]
    fn test_authority_errors_map_to_status() {
        let missing: FraudServiceError = AuthorityError::NotFound("tx1".to_string()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let down: FraudServiceError = AuthorityError::Timeout.into();
        assert_eq!(down.status_code(), StatusCode::BAD_GATEWAY);
    }
}
