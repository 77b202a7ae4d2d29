use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{ItemId, MetadataRecord},
    services::providers::MetadataResolver,
};

/// Identifier-keyed, time-bounded cache in front of another resolver
///
/// Hits skip the remote fetch entirely. Misses fetch through `inner` and
/// store the record in the background with `ttl_secs` to live.
#[derive(Clone)]
pub struct CachedResolver {
    inner: Arc<dyn MetadataResolver>,
    cache: Cache,
    ttl_secs: u64,
}

impl CachedResolver {
    pub fn new(inner: Arc<dyn MetadataResolver>, cache: Cache, ttl_secs: u64) -> Self {
        tracing::info!(provider = inner.name(), ttl_secs, "Metadata cache enabled");
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }
}

#[async_trait::async_trait]
impl MetadataResolver for CachedResolver {
    async fn fetch(&self, id: ItemId) -> AppResult<MetadataRecord> {
        let inner = &self.inner;
        cached!(self.cache, CacheKey::Metadata(id), self.ttl_secs, async move {
            inner.fetch(id).await
        })
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::create_redis_client, services::providers::MockMetadataResolver};

    #[tokio::test]
    async fn test_name_delegates_to_inner() {
        let mut inner = MockMetadataResolver::new();
        inner.expect_name().return_const("myanimelist");

        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client);
        let resolver = CachedResolver::new(Arc::new(inner), cache, 60);

        assert_eq!(resolver.name(), "myanimelist");
    }

    #[tokio::test]
    async fn test_unreachable_cache_propagates_without_fetching() {
        let mut inner = MockMetadataResolver::new();
        inner.expect_name().return_const("myanimelist");
        inner.expect_fetch().never();

        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client);
        let resolver = CachedResolver::new(Arc::new(inner), cache, 60);

        let error = resolver.fetch(ItemId(1)).await.unwrap_err();
        assert!(matches!(error, crate::error::AppError::Cache(_)));
    }
}
