use std::env;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coffeemarket_backend::AppState;
use coffeemarket_backend::handlers;
use coffeemarket_backend::jobs::price_ingestion_sync::start_price_ingestion_job;
use coffeemarket_backend::scrapers::{SourceConfig, barchart::BarchartQuotes};
use coffeemarket_backend::services::exchange_rate::ExchangeRateClient;
use coffeemarket_backend::services::ingestion::IngestionService;
use coffeemarket_backend::services::store::DbMarketStore;

const DEFAULT_INGESTION_INTERVAL_SECS: u64 = 86400; // Once per trading day

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coffeemarket_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Wire the ingestion pipeline
    let source_config = SourceConfig {
        base_url: env::var("SOURCE_BASE_URL")
            .unwrap_or_else(|_| SourceConfig::default().base_url),
        ..SourceConfig::default()
    };
    let rate_base_url =
        env::var("RATE_API_BASE_URL").unwrap_or_else(|_| "https://open.er-api.com".to_string());

    let ingestion = IngestionService::new(
        Arc::new(BarchartQuotes::new(source_config)),
        Arc::new(ExchangeRateClient::new(rate_base_url)),
        Arc::new(DbMarketStore::new(db.clone())),
    );

    // Start the scheduled ingestion job
    let interval_secs = env::var("INGESTION_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INGESTION_INTERVAL_SECS);
    start_price_ingestion_job(ingestion.clone(), interval_secs).await;

    let state = AppState { ingestion };

    // Build router
    let app = Router::new()
        .route("/", get(health))
        .route("/api/ingestion/run", post(handlers::ingestion::run_ingestion))
        .route(
            "/api/ingestion/run/{instrument}",
            post(handlers::ingestion::run_instrument_ingestion),
        )
        .route(
            "/api/ingestion/status",
            get(handlers::ingestion::ingestion_status),
        )
        .route(
            "/api/market-data/{instrument}",
            get(handlers::market_data::get_market_data),
        )
        .route(
            "/api/market-data/{instrument}/discount-values",
            get(handlers::market_data::get_discount_values),
        )
        .route(
            "/api/discount-settings/{instrument}",
            get(handlers::market_data::get_discount_settings),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn health() -> &'static str {
    "coffeemarket-backend is running"
}
