//! Cache Module
//!
//! Bounded entity cache with LRU eviction, lazy TTL expiry and an optional
//! durable backing store. The same cache also holds rendered API responses.

mod durable;
mod entry;
mod lru;
mod response;
mod stats;
mod store;


// Re-export public types
pub use durable::{DeletePolicy, DurableStore, FileStore};
pub use entry::{CacheEntry, Entity};
pub use lru::LruTracker;
pub use response::{
    cache_key, response_cache_config, CachedResponse, ResponseCache, RESPONSE_CACHE_ENTRIES,
    RESPONSE_CACHE_TTL,
};
pub use stats::CacheStats;
pub use store::{CacheConfig, EntityCache};

// == Public Constants ==
/// Maximum allowed entity id length in bytes
pub const MAX_ID_LENGTH: usize = 256;
