//! User-declared holdings and their valuation

use crate::errors::{Error, Result};
use crate::models::PriceMap;
use serde::{Deserialize, Serialize};

/// One user-declared holding: coin id plus held amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub coin: String,
    pub amount: f64,
}

/// Insertion-ordered list of holdings. Persisted as a JSON array.
///
/// Mutations are append and remove-by-index only; callers must take
/// indices from the current list, never from a stale render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Portfolio {
    entries: Vec<PortfolioEntry>,
}

/// One valued holding for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuedEntry {
    pub coin: String,
    pub amount: f64,
    /// Current price, if the lookup knows this coin
    pub price: Option<f64>,
    /// amount x price, 0 when the price is unknown
    pub value: f64,
}

/// Full valuation pass over the portfolio. Always recomputed from
/// scratch; there is no incremental accounting to get out of sync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioValuation {
    pub lines: Vec<ValuedEntry>,
    pub total: f64,
}

impl Portfolio {
    /// Append a holding. The amount must be a positive finite number.
    pub fn add(&mut self, coin: impl Into<String>, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "amount must be a positive number, got {amount}"
            )));
        }
        let coin = coin.into();
        if coin.trim().is_empty() {
            return Err(Error::InvalidInput("coin id must not be empty".to_string()));
        }
        self.entries.push(PortfolioEntry { coin, amount });
        Ok(())
    }

    /// Remove the holding at `index`, taken from the current list.
    pub fn remove(&mut self, index: usize) -> Result<PortfolioEntry> {
        if index >= self.entries.len() {
            return Err(Error::InvalidInput(format!(
                "no portfolio entry at index {index}"
            )));
        }
        Ok(self.entries.remove(index))
    }

    pub fn entries(&self) -> &[PortfolioEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct coin ids in insertion order, for batched price lookups.
    pub fn coin_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !ids.contains(&entry.coin) {
                ids.push(entry.coin.clone());
            }
        }
        ids
    }

    /// Join every entry against the price lookup. Entries whose coin is
    /// absent from `prices` contribute zero but are still listed.
    pub fn value_against(&self, prices: &PriceMap) -> PortfolioValuation {
        let mut total = 0.0;
        let lines = self
            .entries
            .iter()
            .map(|entry| {
                let price = prices.get(&entry.coin).copied();
                let value = price.unwrap_or(0.0) * entry.amount;
                total += value;
                ValuedEntry {
                    coin: entry.coin.clone(),
                    amount: entry.amount,
                    price,
                    value,
                }
            })
            .collect();

        PortfolioValuation { lines, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valuation_joins_against_prices() {
        let mut portfolio = Portfolio::default();
        portfolio.add("a", 2.0).unwrap();

        let prices = PriceMap::from([("a".to_string(), 10.0)]);
        let valuation = portfolio.value_against(&prices);
        assert_eq!(valuation.total, 20.0);
        assert_eq!(valuation.lines[0].price, Some(10.0));

        portfolio.remove(0).unwrap();
        let valuation = portfolio.value_against(&prices);
        assert_eq!(valuation.total, 0.0);
        assert!(valuation.lines.is_empty());
    }

    #[test]
    fn unpriced_entry_contributes_zero_but_stays_listed() {
        let mut portfolio = Portfolio::default();
        portfolio.add("bitcoin", 0.5).unwrap();
        portfolio.add("obscurecoin", 100.0).unwrap();

        let prices = PriceMap::from([("bitcoin".to_string(), 40000.0)]);
        let valuation = portfolio.value_against(&prices);
        assert_eq!(valuation.lines.len(), 2);
        assert_eq!(valuation.lines[1].price, None);
        assert_eq!(valuation.lines[1].value, 0.0);
        assert_eq!(valuation.total, 20000.0);
    }

    #[test]
    fn rejects_invalid_amounts() {
        let mut portfolio = Portfolio::default();
        assert!(portfolio.add("bitcoin", 0.0).is_err());
        assert!(portfolio.add("bitcoin", -1.0).is_err());
        assert!(portfolio.add("bitcoin", f64::NAN).is_err());
        assert!(portfolio.add("", 1.0).is_err());
        assert!(portfolio.is_empty());
    }

    #[test]
    fn rejects_out_of_range_removal() {
        let mut portfolio = Portfolio::default();
        portfolio.add("bitcoin", 1.0).unwrap();
        assert!(portfolio.remove(3).is_err());
        assert_eq!(portfolio.len(), 1);
    }

    #[test]
    fn coin_ids_are_deduplicated_in_order() {
        let mut portfolio = Portfolio::default();
        portfolio.add("bitcoin", 1.0).unwrap();
        portfolio.add("ethereum", 2.0).unwrap();
        portfolio.add("bitcoin", 0.5).unwrap();
        assert_eq!(portfolio.coin_ids(), vec!["bitcoin", "ethereum"]);
    }

    #[test]
    fn persisted_form_round_trips() {
        let mut portfolio = Portfolio::default();
        portfolio.add("bitcoin", 0.25).unwrap();

        let json = serde_json::to_string(&portfolio).unwrap();
        assert_eq!(json, r#"[{"coin":"bitcoin","amount":0.25}]"#);

        let reloaded: Portfolio = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, portfolio);
    }
}
