use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worklog_axum::{
    db, handlers, startup, store::PgRecordStore, AppConfig, AppState, EmployeeContextRegistry, JwksCache, RecordStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with conditional JSON/text output
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string()) == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,worklog_axum=debug,tower_http=debug".into());

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await.map_err(|e| {
        tracing::error!("Failed to create database pool: {}", e);
        e
    })?;
    tracing::info!("Database pool created successfully");

    db::run_migrations(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        e
    })?;
    tracing::info!("Migrations applied");

    let metrics_state = Arc::new(handlers::setup_metrics_recorder());
    tracing::info!("Metrics recorder initialized");

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));
    let contexts = Arc::new(EmployeeContextRegistry::new(
        store.clone(),
        Duration::from_secs(config.session_cache_ttl_secs),
    ));
    let jwks_cache = Arc::new(JwksCache::new(config.oidc_jwks_url.clone()));

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        store,
        contexts,
        jwks_cache,
        config,
        metrics: metrics_state,
    });

    let app = startup::build_router(state)?;

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
