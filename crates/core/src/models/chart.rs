//! Price chart models

use serde::{Deserialize, Serialize};

/// Time series from `/coins/{id}/market_chart`.
///
/// An empty series is valid and means "no chart to draw".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<ChartPoint>,
}

/// One chart sample. CoinGecko encodes samples as `[timestamp_ms, price]`
/// pairs, which serde maps onto this tuple struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint(pub f64, pub f64);

impl ChartPoint {
    pub fn timestamp_ms(&self) -> i64 {
        self.0 as i64
    }

    pub fn price(&self) -> f64 {
        self.1
    }
}

impl MarketChart {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Min/max price over the series, for chart axis bounds.
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.prices.iter().map(ChartPoint::price);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_pair_series() {
        let json = r#"{"prices": [[1700000000000, 43000.5], [1700003600000, 43100.0]]}"#;
        let chart: MarketChart = serde_json::from_str(json).unwrap();
        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.prices[0].timestamp_ms(), 1700000000000);
        assert_eq!(chart.prices[1].price(), 43100.0);
    }

    #[test]
    fn empty_series_is_valid() {
        let chart: MarketChart = serde_json::from_str(r#"{"prices": []}"#).unwrap();
        assert!(chart.is_empty());
        assert_eq!(chart.price_bounds(), None);
    }

    #[test]
    fn price_bounds_cover_series() {
        let chart = MarketChart {
            prices: vec![
                ChartPoint(1.0, 5.0),
                ChartPoint(2.0, 2.5),
                ChartPoint(3.0, 9.0),
            ],
        };
        assert_eq!(chart.price_bounds(), Some((2.5, 9.0)));
    }
}
