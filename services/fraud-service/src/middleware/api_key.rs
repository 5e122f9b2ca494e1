use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;
use sha2::{Digest, Sha256};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use super::API_KEY_HEADER;
use crate::errors::FraudServiceError;

/// Rejects requests without the configured `X-API-Key`, except `/health`
#[derive(Clone)]
pub struct ApiKeyAuth {
    expected: Arc<[u8; 32]>,
}

impl ApiKeyAuth {
    pub fn new(api_key: impl AsRef<str>) -> Self {
        Self {
            expected: Arc::new(digest(api_key.as_ref())),
        }
    }
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

/// Compares fixed-size digests without early exit, so timing reveals
/// neither the key length nor a matching prefix
fn keys_match(expected: &[u8; 32], provided: &str) -> bool {
    let provided = digest(provided);
    expected
        .iter()
        .zip(provided.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service: Rc::new(service),
            expected: self.expected.clone(),
        }))
    }
}

pub struct ApiKeyAuthMiddleware<S> {
    service: Rc<S>,
    expected: Arc<[u8; 32]>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Health checks stay unauthenticated
        if req.path() == "/health" {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await });
        }

        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let rejection = if provided.is_empty() {
            Some("API key missing")
        } else if !keys_match(&self.expected, provided) {
            Some("Invalid API key")
        } else {
            None
        };

        match rejection {
            None => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Some(message) => {
                tracing::warn!("Rejected request to {}: {}", req.path(), message);
                Box::pin(async move {
                    Err(FraudServiceError::Unauthorized(message.to_string()).into())
                })
            }
        }
    }
}
