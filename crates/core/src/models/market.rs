//! Market-wide summary cards

use super::CoinRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many of the top coins feed the average-change gauge.
const SENTIMENT_SAMPLE: usize = 50;

/// Aggregate figures for the dashboard header, derived from the full
/// market list on each refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub total_market_cap: f64,
    pub total_volume_24h: f64,
    /// Average 24h change over the top coins (missing values count as 0)
    pub average_change_24h: f64,
    pub btc_price: f64,
    /// Synthetic sentiment gauge in 0..=100, centered at 50
    pub fear_greed: f64,
    pub updated_at: DateTime<Utc>,
}

impl MarketSummary {
    pub fn from_coins(coins: &[CoinRecord]) -> Self {
        let total_market_cap: f64 = coins.iter().map(CoinRecord::market_cap_or_zero).sum();
        let total_volume_24h: f64 = coins.iter().map(CoinRecord::volume_or_zero).sum();

        let sample = &coins[..coins.len().min(SENTIMENT_SAMPLE)];
        let average_change_24h = if sample.is_empty() {
            0.0
        } else {
            sample
                .iter()
                .map(|c| c.change_24h.unwrap_or(0.0))
                .sum::<f64>()
                / sample.len() as f64
        };

        let btc_price = coins
            .iter()
            .find(|c| c.id == "bitcoin")
            .map(CoinRecord::price_or_zero)
            .unwrap_or(0.0);

        let fear_greed = (50.0 + average_change_24h * 2.2).clamp(0.0, 100.0);

        Self {
            total_market_cap,
            total_volume_24h,
            average_change_24h,
            btc_price,
            fear_greed,
            updated_at: Utc::now(),
        }
    }
}

/// Compact dollar formatting for header cards ($2.26T, $423.45M, ...)
pub fn format_currency_short(value: f64) -> String {
    if value >= 1e12 {
        format!("${:.2}T", value / 1e12)
    } else if value >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else {
        format!("${:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, price: f64, cap: f64, volume: f64, change_24h: Option<f64>) -> CoinRecord {
        CoinRecord {
            id: id.to_string(),
            symbol: id.to_string(),
            name: id.to_string(),
            image: None,
            current_price: Some(price),
            market_cap: Some(cap),
            market_cap_rank: None,
            total_volume: Some(volume),
            change_1h: None,
            change_24h,
            change_7d: None,
        }
    }

    #[test]
    fn summary_aggregates_caps_and_volumes() {
        let coins = vec![
            coin("bitcoin", 43000.0, 800e9, 18e9, Some(2.0)),
            coin("ethereum", 2300.0, 280e9, 9e9, Some(-1.0)),
        ];
        let summary = MarketSummary::from_coins(&coins);
        assert_eq!(summary.total_market_cap, 1080e9);
        assert_eq!(summary.total_volume_24h, 27e9);
        assert_eq!(summary.btc_price, 43000.0);
        assert_eq!(summary.average_change_24h, 0.5);
    }

    #[test]
    fn fear_greed_is_clamped() {
        let coins = vec![coin("a", 1.0, 1.0, 1.0, Some(40.0))];
        let summary = MarketSummary::from_coins(&coins);
        assert_eq!(summary.fear_greed, 100.0);

        let coins = vec![coin("a", 1.0, 1.0, 1.0, Some(-40.0))];
        let summary = MarketSummary::from_coins(&coins);
        assert_eq!(summary.fear_greed, 0.0);
    }

    #[test]
    fn empty_market_yields_zeroed_summary() {
        let summary = MarketSummary::from_coins(&[]);
        assert_eq!(summary.total_market_cap, 0.0);
        assert_eq!(summary.average_change_24h, 0.0);
        assert_eq!(summary.fear_greed, 50.0);
    }

    #[test]
    fn short_currency_formatting() {
        assert_eq!(format_currency_short(2.26e12), "$2.26T");
        assert_eq!(format_currency_short(423.45e6), "$423.45M");
        assert_eq!(format_currency_short(57.91e6), "$57.91M");
        assert_eq!(format_currency_short(5318.89), "$5318.89");
    }
}
