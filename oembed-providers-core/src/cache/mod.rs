pub mod backend;
pub mod invalidation;
pub mod memory;
pub mod redis;

pub use backend::{get_json, set_json, CacheBackend, CacheItem};
pub use invalidation::{
    CacheInvalidationService, CacheTarget, InvalidationTrigger, DEFAULT_MEDIA_SOURCE_CACHE_KEY,
    DEFAULT_PROVIDERS_CACHE_KEY, PROVIDERS_CACHE_KEY,
};
pub use memory::MemoryCacheBackend;
pub use redis::RedisCacheBackend;
