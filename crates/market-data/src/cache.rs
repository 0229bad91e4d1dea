//! In-memory TTL cache for fetched market data.
//!
//! Entries are written on every successful fetch and overwritten by the next
//! one. Validity is computed lazily at read time against a TTL supplied by the
//! caller; nothing is ever evicted, so the key space must stay small (a fixed
//! set of tracked symbols).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::warn;
use tokio::time::Instant;

use crate::models::{DataKind, IndicatorKind, Interval};

/// A cached value and when it was stored.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Result of a cache read: the stored value and whether it is still fresh.
#[derive(Clone, Debug, PartialEq)]
pub struct Lookup<V> {
    pub value: V,
    pub valid: bool,
}

/// Key -> (value, insertion instant) store.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the entries, recovering from poison.
    ///
    /// A poisoned cache only means a writer panicked mid-insert; the map
    /// itself is still usable.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Market data cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Read an entry. `valid` is `age < ttl`.
    pub fn get(&self, key: &K, ttl: Duration) -> Option<Lookup<V>> {
        let entries = self.lock_entries();
        entries.get(key).map(|entry| Lookup {
            value: entry.value.clone(),
            valid: entry.inserted_at.elapsed() < ttl,
        })
    }

    /// Read an entry only if it is still fresh.
    pub fn get_valid(&self, key: &K, ttl: Duration) -> Option<V> {
        self.get(key, ttl)
            .filter(|lookup| lookup.valid)
            .map(|lookup| lookup.value)
    }

    /// Store a value stamped with the current instant, replacing any previous entry.
    pub fn put(&self, key: K, value: V) {
        let mut entries = self.lock_entries();
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key composed from data kind, symbol and request parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn quote(symbol: &str) -> Self {
        Self(format!("{}:{}", DataKind::Quote, symbol.to_uppercase()))
    }

    pub fn historical(symbol: &str, interval: Interval) -> Self {
        Self(format!(
            "{}:{}:{}",
            DataKind::Historical,
            symbol.to_uppercase(),
            interval
        ))
    }

    pub fn indicator(symbol: &str, kind: IndicatorKind) -> Self {
        Self(format!(
            "{}:{}:{}",
            DataKind::Indicator,
            symbol.to_uppercase(),
            kind
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_valid() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::new();
        cache.put(CacheKey::quote("AAPL"), 7);

        let lookup = cache
            .get(&CacheKey::quote("AAPL"), Duration::from_secs(60))
            .unwrap();
        assert_eq!(lookup.value, 7);
        assert!(lookup.valid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::new();
        let key = CacheKey::quote("MSFT");
        let ttl = Duration::from_secs(60);
        cache.put(key.clone(), 1);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get(&key, ttl).unwrap().valid);

        tokio::time::advance(Duration::from_secs(1)).await;
        let lookup = cache.get(&key, ttl).unwrap();
        assert!(!lookup.valid);
        // Stale entries are kept, not evicted
        assert_eq!(lookup.value, 1);
        assert!(cache.get_valid(&key, ttl).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_refreshes() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::new();
        let key = CacheKey::quote("TSLA");
        let ttl = Duration::from_secs(30);

        cache.put(key.clone(), 1);
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.put(key.clone(), 2);

        assert_eq!(cache.get_valid(&key, ttl), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::new();
        assert!(cache.is_empty());
        assert!(cache
            .get(&CacheKey::quote("NOPE"), Duration::from_secs(1))
            .is_none());
    }

    #[test]
    fn test_keys_include_request_parameters() {
        assert_eq!(CacheKey::quote("aapl").as_str(), "quote:AAPL");
        assert_eq!(
            CacheKey::historical("AAPL", Interval::FiveMinutes).as_str(),
            "historical:AAPL:5min"
        );
        assert_ne!(
            CacheKey::indicator("AAPL", IndicatorKind::Rsi),
            CacheKey::indicator("AAPL", IndicatorKind::Macd)
        );
    }
}
