//! Last-known price cache
//!
//! Backs the portfolio valuation policy: when a price lookup fails, the
//! previously fetched prices keep being used instead of degrading the
//! valuation to zero. Entries are only ever replaced by newer data,
//! never expired.

use coindeck_core::PriceMap;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

struct CachedPrice {
    price: f64,
    updated_at: Instant,
}

/// Thread-safe map of coin id -> last successfully fetched price.
pub struct PriceCache {
    prices: RwLock<HashMap<String, CachedPrice>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Record one price.
    pub fn insert(&self, id: &str, price: f64) {
        if let Ok(mut prices) = self.prices.write() {
            prices.insert(
                id.to_string(),
                CachedPrice {
                    price,
                    updated_at: Instant::now(),
                },
            );
        }
    }

    /// Merge a whole lookup result, e.g. after a market refresh.
    pub fn insert_many(&self, batch: &PriceMap) {
        if let Ok(mut prices) = self.prices.write() {
            let now = Instant::now();
            for (id, price) in batch {
                prices.insert(
                    id.clone(),
                    CachedPrice {
                        price: *price,
                        updated_at: now,
                    },
                );
            }
        }
    }

    /// Last-known price for a coin, however old.
    pub fn get(&self, id: &str) -> Option<f64> {
        let prices = self.prices.read().ok()?;
        prices.get(id).map(|entry| entry.price)
    }

    /// Seconds since a coin's price was last refreshed.
    pub fn age_secs(&self, id: &str) -> Option<u64> {
        let prices = self.prices.read().ok()?;
        prices.get(id).map(|entry| entry.updated_at.elapsed().as_secs())
    }

    /// Flat snapshot of everything cached, for a full valuation pass.
    pub fn snapshot(&self) -> PriceMap {
        self.prices
            .read()
            .map(|prices| {
                prices
                    .iter()
                    .map(|(id, entry)| (id.clone(), entry.price))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.prices.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_persist_until_replaced() {
        let cache = PriceCache::new();
        cache.insert("bitcoin", 40000.0);
        assert_eq!(cache.get("bitcoin"), Some(40000.0));

        cache.insert("bitcoin", 41000.0);
        assert_eq!(cache.get("bitcoin"), Some(41000.0));
        assert_eq!(cache.get("ethereum"), None);
    }

    #[test]
    fn insert_many_merges_without_dropping_others() {
        let cache = PriceCache::new();
        cache.insert("bitcoin", 40000.0);

        let batch = PriceMap::from([("ethereum".to_string(), 2300.0)]);
        cache.insert_many(&batch);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["bitcoin"], 40000.0);
        assert_eq!(snapshot["ethereum"], 2300.0);
    }

    #[test]
    fn age_is_tracked_per_coin() {
        let cache = PriceCache::new();
        assert_eq!(cache.age_secs("bitcoin"), None);

        cache.insert("bitcoin", 40000.0);
        assert!(cache.age_secs("bitcoin").is_some_and(|age| age < 5));
        assert_eq!(cache.age_secs("ethereum"), None);
    }
}
