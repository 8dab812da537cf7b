use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geldhero_intake::config::{Config, StoreBackend};
use geldhero_intake::db::Database;
use geldhero_intake::handlers::{self, AppState};
use geldhero_intake::pg_store::PgResponseStore;
use geldhero_intake::routes;
use geldhero_intake::store::{MemoryStore, ResponseStore};
use geldhero_intake::supabase_client::SupabaseClient;

/// Builds the configured response store.
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ResponseStore>> {
    let store: Arc<dyn ResponseStore> = match config.store_backend {
        StoreBackend::Supabase => {
            let url = config
                .supabase_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL environment variable required"))?;
            let key = config.supabase_anon_key.clone().ok_or_else(|| {
                anyhow::anyhow!("SUPABASE_ANON_KEY environment variable required")
            })?;
            let client = SupabaseClient::new(url.clone(), key)?;
            tracing::info!("✓ Supabase client initialized: {}", url);
            Arc::new(client)
        }
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
            })?;
            let db = Database::new(url).await?;
            tracing::info!("Database connection pool established");
            Arc::new(PgResponseStore::new(db.pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory response store; submissions are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(store)
}

/// Main entry point for the application.
///
/// Initializes logging, configuration, the response store, the session
/// cache and the HTTP routes, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geldhero_intake=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let store = build_store(&config).await?;

    // Build application state
    let app_state = Arc::new(AppState::new(config.clone(), store));
    tracing::info!(
        "Intake session cache initialized ({}s TTL, {} capacity)",
        config.session_ttl_secs,
        config.session_capacity
    );

    // Warm the admin snapshot; an unreachable backend is not fatal here
    if let Err(e) = handlers::refresh_browser(app_state.clone()).await {
        tracing::warn!("Initial response refresh failed: {}", e);
    }

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Build protected routes with security layers
    let protected_routes = routes::api_routes().layer(
        ServiceBuilder::new()
            // Request size limit: 64KB is plenty for form payloads
            .layer(RequestBodyLimitLayer::new(64 * 1024))
            // Rate limiting: 10 req/sec per IP, burst of 20
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
