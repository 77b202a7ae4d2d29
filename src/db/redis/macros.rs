/// Read-through caching over a [`Cache`](crate::db::Cache).
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, queues the computed value for a background write with `$ttl`
/// seconds to live, and returns it wrapped in `Ok`. Errors from the cache
/// read or from the block propagate through `?`, so use it as the tail of a
/// function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// async fn fetch(&self, id: ItemId) -> AppResult<MetadataRecord> {
///     cached!(self.cache, CacheKey::Metadata(id), self.ttl, async move {
///         self.inner.fetch(id).await
///     })
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            tracing::debug!(key = %$key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
