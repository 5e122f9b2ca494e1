pub mod api_key;
pub mod rate_limit;

pub use api_key::ApiKeyAuth;
pub use rate_limit::RateLimiter;

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "X-API-Key";
