use config::{ConfigError, Environment};
use fraud_engine::RiskThresholds;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub fraud: FraudConfig,
    pub transaction_service: TransactionServiceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub api_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    /// Per API key
    pub requests_per_second: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FraudConfig {
    pub medium_risk_threshold: f64,
    pub high_risk_threshold: f64,
    pub lookup_timeout_ms: u64,
    /// JSON array of rules replacing the default catalog
    #[serde(default)]
    pub rules_file: Option<String>,
    /// JSON seed document for the in-memory fraud data
    #[serde(default)]
    pub seed_file: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TransactionServiceConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8086)?
            .set_default("server.workers", 4)?
            // Auth
            .set_default("auth.api_key", "")?
            // Rate limiting
            .set_default("rate_limit.requests_per_second", 5)?
            // Fraud thresholds
            .set_default("fraud.medium_risk_threshold", 50.0)?
            .set_default("fraud.high_risk_threshold", 100.0)?
            .set_default("fraud.lookup_timeout_ms", 2000)?
            // Transaction service
            .set_default("transaction_service.url", "http://transaction-service:7000")?
            .set_default("transaction_service.timeout_ms", 5000)?;

        builder = builder.add_source(Environment::with_prefix("FRAUD_SERVICE").separator("__"));

        // Override from environment variables
        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(api_key) = env::var("API_KEY") {
            builder = builder.set_override("auth.api_key", api_key)?;
        }

        if let Ok(url) = env::var("TRANSACTION_SERVICE_URL") {
            builder = builder.set_override("transaction_service.url", url)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.api_key.is_empty() {
            return Err(ConfigError::Message(
                "auth.api_key must be set (API_KEY)".to_string(),
            ));
        }
        if self.rate_limit.requests_per_second == 0 {
            return Err(ConfigError::Message(
                "rate_limit.requests_per_second must be positive".to_string(),
            ));
        }
        self.fraud.thresholds()?;
        Ok(())
    }
}

impl FraudConfig {
    pub fn thresholds(&self) -> Result<RiskThresholds, ConfigError> {
        RiskThresholds::new(self.medium_risk_threshold, self.high_risk_threshold)
            .map_err(|e| ConfigError::Message(e.to_string()))
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl TransactionServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
