//! Cache Entry Module
//!
//! Defines the cached entity contract and the per-entry freshness metadata.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::time::Instant;

// == Entity ==
/// A value the cache can hold, identified by its own id.
///
/// The same shape is what a durable backing store persists.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable identifier used as the cache key.
    fn id(&self) -> &str;
}

// == Cache Entry ==
/// Snapshot of an entity taken at insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry<E> {
    /// The stored entity
    pub value: E,
    /// When the snapshot was inserted (or re-populated)
    pub inserted_at: Instant,
}

impl<E> CacheEntry<E> {
    // == Constructor ==
    /// Creates an entry stamped with the current instant.
    pub fn new(value: E) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    // == Age ==
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.inserted_at)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl`.
    ///
    /// Boundary condition: the entry is expired as soon as its age reaches
    /// the TTL, so a fully elapsed TTL never serves stale data.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    // == Time To Live ==
    /// Returns how long the entry stays fresh, zero once expired.
    pub fn ttl_remaining(&self, ttl: Duration) -> Duration {
        ttl.saturating_sub(self.age())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_on_creation() {
        let entry = CacheEntry::new("value".to_string());

        assert_eq!(entry.value, "value");
        assert!(!entry.is_expired(TTL));
        assert_eq!(entry.ttl_remaining(TTL), TTL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiration() {
        let entry = CacheEntry::new("value".to_string());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!entry.is_expired(TTL));
        assert_eq!(entry.ttl_remaining(TTL), Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(entry.is_expired(TTL));
        assert_eq!(entry.ttl_remaining(TTL), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(1u32);

        tokio::time::advance(TTL).await;

        assert!(entry.is_expired(TTL), "Entry should be expired at boundary");
    }
}
