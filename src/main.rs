use std::{sync::Arc, time::Duration};

use similar_titles::{
    config::Config,
    db::{create_redis_client, Cache, CacheWriterHandle, CatalogStore, SimilarityStore},
    routes::{create_router, AppState},
    services::{
        providers::{CachedResolver, MetadataResolver, MyAnimeListResolver},
        RecommendationService,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("similar_titles=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Tables are loaded once and shared read-only by every request
    let catalog = Arc::new(CatalogStore::load_path(&config.catalog_path)?);
    let similarity = Arc::new(SimilarityStore::load_path(&config.similarity_path)?);
    check_consistency(&catalog, &similarity, config.strict_data)?;

    let timeout = config.fetch_timeout_secs.map(Duration::from_secs);
    let page_resolver: Arc<dyn MetadataResolver> = Arc::new(MyAnimeListResolver::new(
        config.detail_url_template.clone(),
        timeout,
    )?);

    let (resolver, cache_writer): (Arc<dyn MetadataResolver>, Option<CacheWriterHandle>) =
        match &config.redis_url {
            Some(redis_url) => {
                let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
                let cached: Arc<dyn MetadataResolver> = Arc::new(CachedResolver::new(
                    page_resolver,
                    cache,
                    config.metadata_cache_ttl,
                ));
                (cached, Some(handle))
            }
            None => (page_resolver, None),
        };

    let recommender = RecommendationService::new(catalog, similarity, resolver)
        .with_concurrent_fetches(config.concurrent_fetches);

    let state = Arc::new(AppState {
        recommender: Arc::new(recommender),
        default_sample_size: config.default_sample_size,
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

/// Reports similarity identifiers the catalog can't resolve
fn check_consistency(
    catalog: &CatalogStore,
    similarity: &SimilarityStore,
    strict: bool,
) -> anyhow::Result<()> {
    let orphans = similarity.orphans(catalog);
    if orphans.is_empty() {
        return Ok(());
    }

    let preview: Vec<String> = orphans.iter().take(10).map(|id| id.to_string()).collect();
    if strict {
        anyhow::bail!(
            "{} similarity identifiers are missing from the catalog (first: {})",
            orphans.len(),
            preview.join(", ")
        );
    }

    tracing::warn!(
        orphans = orphans.len(),
        first = %preview.join(", "),
        "Similarity table references identifiers missing from the catalog"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
