use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sitenav_api::{
    api::{build_cors_layer, create_router, AppState},
    config::{Config, HistoryBackend, SearchAnalyticsBackend},
    db::{create_pool, create_redis_client, Cache},
    services::{
        catalog::load_catalog,
        history::{HistoryStore, MemoryHistoryStore, RedisHistoryStore},
        search_analytics::{
            CachedSearchAnalytics, NoSearchAnalytics, PostgresSearchAnalytics,
            RestSearchAnalytics, SearchAnalyticsStore,
        },
        RecommendationSettings,
    },
};

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_json);

    let catalog = load_catalog(config.catalog_path.as_deref()).context("Failed to load catalog")?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client).await;

    let history: Arc<dyn HistoryStore> = match config.history_backend {
        HistoryBackend::Redis => Arc::new(RedisHistoryStore::new(cache.clone())),
        HistoryBackend::Memory => Arc::new(MemoryHistoryStore::new()),
    };

    let search_source: Arc<dyn SearchAnalyticsStore> = match config.search_analytics_backend {
        SearchAnalyticsBackend::Postgres => {
            let pool = create_pool(&config.database_url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            Arc::new(PostgresSearchAnalytics::new(pool))
        }
        SearchAnalyticsBackend::Rest => {
            let (url, key) = config
                .baas_url
                .clone()
                .zip(config.baas_api_key.clone())
                .context("BAAS_URL and BAAS_API_KEY must be set")?;
            Arc::new(RestSearchAnalytics::new(url, key))
        }
        SearchAnalyticsBackend::Disabled => Arc::new(NoSearchAnalytics),
    };

    let search_analytics: Arc<dyn SearchAnalyticsStore> =
        if config.search_analytics_backend == SearchAnalyticsBackend::Disabled {
            search_source
        } else {
            Arc::new(CachedSearchAnalytics::new(
                search_source,
                cache.clone(),
                config.search_cache_ttl_secs,
            ))
        };

    tracing::info!(
        history_backend = ?config.history_backend,
        search_analytics_backend = search_analytics.name(),
        catalog_items = catalog.len(),
        "Services initialized"
    );

    let state = AppState::new(
        history,
        search_analytics,
        catalog,
        RecommendationSettings::from(&config),
    );

    let origins = config.cors_origins();
    let mut app = create_router(state);
    if !origins.is_empty() {
        app = app.layer(build_cors_layer(&origins));
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;

    Ok(())
}
