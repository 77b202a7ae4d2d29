pub mod catalog;
pub mod redis;
pub mod similarity;

pub use catalog::CatalogStore;
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::CacheWriterHandle;
pub use similarity::SimilarityStore;
