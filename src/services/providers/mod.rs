/// Title metadata providers
///
/// A provider turns an item identifier into display metadata by fetching
/// and parsing a detail page. Providers never cache; caching is layered on
/// top by [`cached::CachedResolver`].
use crate::{
    error::AppResult,
    models::{ItemId, MetadataRecord},
};

pub mod cached;
pub mod myanimelist;

pub use cached::CachedResolver;
pub use myanimelist::MyAnimeListResolver;

/// Trait for title metadata providers
///
/// `fetch` fails with a fetch error on transport failure or a non-success
/// status. Fields missing from the page come back as `None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Fetch and parse the detail page of one title
    async fn fetch(&self, id: ItemId) -> AppResult<MetadataRecord>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
