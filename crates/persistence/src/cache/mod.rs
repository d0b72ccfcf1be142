//! In-memory caching layer for market data responses

use mirror_core::MarketCoin;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cached item with expiration
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Thread-safe cache of market listings keyed by query, with TTL and max-entry bounds
pub struct MarketCache {
    listings: RwLock<HashMap<String, CacheEntry<Vec<MarketCoin>>>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl MarketCache {
    pub fn with_capacity(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            default_ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn new(default_ttl: Duration) -> Self {
        Self::with_capacity(default_ttl, 64)
    }

    /// Get a listing if present and not expired
    pub fn get(&self, key: &str) -> Option<Vec<MarketCoin>> {
        let cache = self.listings.read().ok()?;
        let entry = cache.get(key)?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Insert or replace a listing. Evicts expired entries, then the oldest, at capacity.
    pub fn insert(&self, key: &str, coins: Vec<MarketCoin>) {
        self.insert_with_ttl(key, coins, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: &str, coins: Vec<MarketCoin>, ttl: Duration) {
        if let Ok(mut cache) = self.listings.write() {
            if cache.len() >= self.max_entries && !cache.contains_key(key) {
                cache.retain(|_, entry| !entry.is_expired());
            }

            if cache.len() >= self.max_entries && !cache.contains_key(key) {
                if let Some(oldest_key) = cache
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    cache.remove(&oldest_key);
                }
            }

            cache.insert(
                key.to_string(),
                CacheEntry {
                    value: coins,
                    inserted_at: Instant::now(),
                    ttl,
                },
            );
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Ok(mut cache) = self.listings.write() {
            cache.remove(key);
        }
    }

    /// Clear all expired entries
    pub fn cleanup(&self) {
        if let Ok(mut cache) = self.listings.write() {
            cache.retain(|_, entry| !entry.is_expired());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.listings.write() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.listings.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MarketCache {
    fn default() -> Self {
        // Market listings move slowly; 60 seconds keeps us under public rate limits
        Self::with_capacity(Duration::from_secs(60), 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str) -> MarketCoin {
        MarketCoin {
            id: id.to_string(),
            name: id.to_string(),
            symbol: None,
            current_price: 1.0,
            market_cap: 1.0,
            price_change_percentage_24h: None,
            total_volume: None,
        }
    }

    #[test]
    fn test_hit_then_expire() {
        let cache = MarketCache::new(Duration::from_secs(60));
        cache.insert("top10", vec![coin("bitcoin")]);
        assert_eq!(cache.get("top10").unwrap()[0].id, "bitcoin");

        cache.insert_with_ttl("stale", vec![coin("eth")], Duration::ZERO);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("stale").is_none());

        cache.cleanup();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let cache = MarketCache::with_capacity(Duration::from_secs(60), 2);
        cache.insert("a", vec![coin("a")]);
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("b", vec![coin("b")]);
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("c", vec![coin("c")]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_invalidate() {
        let cache = MarketCache::default();
        cache.insert("a", vec![coin("a")]);
        cache.invalidate("a");
        assert!(cache.is_empty());
    }
}
