//! Coin-related models

use serde::{Deserialize, Serialize};

/// One market snapshot for a single tradable asset, as returned by
/// the CoinGecko `/coins/markets` endpoint.
///
/// The list is replaced wholesale on every refresh; records are never
/// patched in place. CoinGecko serves `null` for numeric fields it has
/// no data for, so every metric is optional here and treated as zero
/// only at comparison/valuation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default, rename = "price_change_percentage_1h_in_currency")]
    pub change_1h: Option<f64>,
    #[serde(default, rename = "price_change_percentage_24h")]
    pub change_24h: Option<f64>,
    #[serde(default, rename = "price_change_percentage_7d_in_currency")]
    pub change_7d: Option<f64>,
}

impl CoinRecord {
    pub fn price_or_zero(&self) -> f64 {
        self.current_price.unwrap_or(0.0)
    }

    pub fn market_cap_or_zero(&self) -> f64 {
        self.market_cap.unwrap_or(0.0)
    }

    pub fn volume_or_zero(&self) -> f64 {
        self.total_volume.unwrap_or(0.0)
    }

    /// Case-insensitive substring match against name or symbol.
    /// An empty (or all-whitespace) query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q) || self.symbol.to_lowercase().contains(&q)
    }
}
