use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use fraud_engine::{
    DecisionEngine, HttpTransactionAuthority, InMemoryFraudDataProvider, PaymentChannelValidator,
    PaymentLinkValidator, RuleCatalog, SeedData, TransactionAuthority,
};
use fraud_service::{
    config::Config, handlers, metrics, middleware::ApiKeyAuth, middleware::RateLimiter, AppState,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting Fraud Service...");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let catalog = match &config.fraud.rules_file {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read rules file {}", path))?;
            RuleCatalog::from_json(&json)
                .with_context(|| format!("Invalid rules file {}", path))?
        }
        None => RuleCatalog::default_rules(),
    };
    info!("Loaded {} fraud rules", catalog.len());

    let seed = match &config.fraud.seed_file {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read seed file {}", path))?;
            serde_json::from_str::<SeedData>(&json)
                .with_context(|| format!("Invalid seed file {}", path))?
        }
        None => SeedData::default(),
    };

    let provider = InMemoryFraudDataProvider::from_seed(&seed);
    info!("Seeded fraud data for {} customers", provider.tracked_customers());

    let engine = DecisionEngine::new(Arc::new(catalog), Arc::new(provider))
        .with_thresholds(config.fraud.thresholds()?)
        .with_lookup_timeout(config.fraud.lookup_timeout());

    let authority: Arc<dyn TransactionAuthority> = Arc::new(
        HttpTransactionAuthority::new(
            &config.transaction_service.url,
            config.transaction_service.timeout(),
        )
        .context("Failed to create transaction service client")?,
    );
    let link_validator = PaymentLinkValidator::new(authority.clone())
        .with_fetch_timeout(config.transaction_service.timeout());
    let channel_validator =
        PaymentChannelValidator::from_flagged(&seed.flagged_channel_transactions);

    let state = AppState::new(engine, authority, link_validator, channel_validator);
    let limiter = RateLimiter::per_second(config.rate_limit.requests_per_second);
    let auth = ApiKeyAuth::new(config.auth.api_key.clone());

    metrics::init();
    info!("Fraud components initialized successfully");

    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        let limiter = limiter.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(auth.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .configure(move |cfg| handlers::configure_routes(cfg, limiter))
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    Ok(())
}
