//! Memoization of computed betas with a fixed time-to-live.
//!
//! The cache owns key composition, value serialization and expiry; the
//! storage technology behind it is an injected [`KeyValueCollection`].

use crate::core::beta::BetaEstimate;
use crate::core::price::ProviderKind;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Maximum age of a cached estimate before it is recomputed.
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Minimal string key-value contract the cache is built on. Implementations
/// provide their own atomicity if shared between writers; this layer does
/// not lock.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String);
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredBeta {
    beta: Option<f64>,
    sample_size: usize,
    timestamp_ms: i64,
}

pub struct BetaCache {
    store: Arc<dyn KeyValueCollection>,
}

impl BetaCache {
    pub fn new(store: Arc<dyn KeyValueCollection>) -> Self {
        BetaCache { store }
    }

    fn key(
        provider: ProviderKind,
        symbol: &str,
        market_symbol: &str,
        lookback_days: u32,
    ) -> String {
        format!("beta:{provider}:{symbol}:{market_symbol}:{lookback_days}")
    }

    pub async fn get(
        &self,
        provider: ProviderKind,
        symbol: &str,
        market_symbol: &str,
        lookback_days: u32,
    ) -> Option<BetaEstimate> {
        self.get_at(
            provider,
            symbol,
            market_symbol,
            lookback_days,
            Utc::now().timestamp_millis(),
        )
        .await
    }

    pub async fn put(
        &self,
        provider: ProviderKind,
        symbol: &str,
        market_symbol: &str,
        lookback_days: u32,
        estimate: BetaEstimate,
    ) {
        self.put_at(
            provider,
            symbol,
            market_symbol,
            lookback_days,
            estimate,
            Utc::now().timestamp_millis(),
        )
        .await
    }

    /// Lookup with an explicit clock. An expired or unparseable entry is
    /// indistinguishable from absence.
    pub async fn get_at(
        &self,
        provider: ProviderKind,
        symbol: &str,
        market_symbol: &str,
        lookback_days: u32,
        now_ms: i64,
    ) -> Option<BetaEstimate> {
        let key = Self::key(provider, symbol, market_symbol, lookback_days);
        let raw = self.store.get(&key).await?;

        let stored: StoredBeta = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                debug!("Discarding unparseable cache entry for {}: {}", key, e);
                return None;
            }
        };

        if now_ms - stored.timestamp_ms >= CACHE_TTL_MS {
            debug!("Cache entry expired for {}", key);
            return None;
        }

        debug!("Cache HIT for {}", key);
        Some(BetaEstimate {
            beta: stored.beta,
            sample_size: stored.sample_size,
        })
    }

    /// Store with an explicit clock, overwriting any prior entry.
    pub async fn put_at(
        &self,
        provider: ProviderKind,
        symbol: &str,
        market_symbol: &str,
        lookback_days: u32,
        estimate: BetaEstimate,
        now_ms: i64,
    ) {
        let key = Self::key(provider, symbol, market_symbol, lookback_days);
        let stored = StoredBeta {
            beta: estimate.beta,
            sample_size: estimate.sample_size,
            timestamp_ms: now_ms,
        };
        // StoredBeta always serializes.
        let value = serde_json::to_string(&stored).unwrap();
        debug!("Cache PUT for {}", key);
        self.store.set(&key, value).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct FakeCollection {
        inner: Mutex<HashMap<String, String>>,
    }

    impl FakeCollection {
        fn new() -> Arc<Self> {
            Arc::new(FakeCollection {
                inner: Mutex::new(HashMap::new()),
            })
        }
    }

    #[async_trait]
    impl KeyValueCollection for FakeCollection {
        async fn get(&self, key: &str) -> Option<String> {
            self.inner.lock().await.get(key).cloned()
        }

        async fn set(&self, key: &str, value: String) {
            self.inner.lock().await.insert(key.to_string(), value);
        }
    }

    const LOOKBACK: u32 = 365;

    #[tokio::test]
    async fn test_cache_round_trip() {
        let store = FakeCollection::new();
        let cache = BetaCache::new(store);
        let estimate = BetaEstimate {
            beta: Some(1.23),
            sample_size: 250,
        };

        assert!(
            cache
                .get(ProviderKind::Yahoo, "AAPL", "SPY", LOOKBACK)
                .await
                .is_none()
        );

        cache
            .put(ProviderKind::Yahoo, "AAPL", "SPY", LOOKBACK, estimate)
            .await;
        let cached = cache
            .get(ProviderKind::Yahoo, "AAPL", "SPY", LOOKBACK)
            .await
            .unwrap();
        assert_eq!(cached, estimate);
    }

    #[tokio::test]
    async fn test_cache_keys_separate_providers_and_windows() {
        let store = FakeCollection::new();
        let cache = BetaCache::new(store);
        let estimate = BetaEstimate {
            beta: Some(0.9),
            sample_size: 100,
        };

        cache
            .put(ProviderKind::Yahoo, "AAPL", "SPY", LOOKBACK, estimate)
            .await;

        assert!(
            cache
                .get(ProviderKind::Stooq, "AAPL", "SPY", LOOKBACK)
                .await
                .is_none()
        );
        assert!(
            cache
                .get(ProviderKind::Yahoo, "AAPL", "SPY", LOOKBACK * 2)
                .await
                .is_none()
        );
        assert!(
            cache
                .get(ProviderKind::Yahoo, "AAPL", "QQQ", LOOKBACK)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_cache_expires_after_ttl() {
        let store = FakeCollection::new();
        let cache = BetaCache::new(store);
        let estimate = BetaEstimate {
            beta: Some(1.1),
            sample_size: 200,
        };

        let t0 = 1_700_000_000_000;
        cache
            .put_at(ProviderKind::Stooq, "aapl.us", "spy.us", LOOKBACK, estimate, t0)
            .await;

        // Just inside the TTL.
        assert!(
            cache
                .get_at(
                    ProviderKind::Stooq,
                    "aapl.us",
                    "spy.us",
                    LOOKBACK,
                    t0 + CACHE_TTL_MS - 1
                )
                .await
                .is_some()
        );

        // At and past the TTL the entry reads as absent.
        assert!(
            cache
                .get_at(
                    ProviderKind::Stooq,
                    "aapl.us",
                    "spy.us",
                    LOOKBACK,
                    t0 + CACHE_TTL_MS
                )
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let store = FakeCollection::new();
        store
            .set(
                &BetaCache::key(ProviderKind::Yahoo, "AAPL", "SPY", LOOKBACK),
                "not json".to_string(),
            )
            .await;

        let cache = BetaCache::new(store);
        assert!(
            cache
                .get(ProviderKind::Yahoo, "AAPL", "SPY", LOOKBACK)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_undefined_beta_round_trips() {
        let store = FakeCollection::new();
        let cache = BetaCache::new(store);

        cache
            .put(
                ProviderKind::Yahoo,
                "FLAT",
                "SPY",
                LOOKBACK,
                BetaEstimate::undefined(3),
            )
            .await;
        let cached = cache
            .get(ProviderKind::Yahoo, "FLAT", "SPY", LOOKBACK)
            .await
            .unwrap();
        assert_eq!(cached.beta, None);
        assert_eq!(cached.sample_size, 3);
    }
}
