//! Data models

mod chart;
mod coin;
mod market;

pub use chart::{ChartPoint, MarketChart};
pub use coin::CoinRecord;
pub use market::{format_currency_short, MarketSummary};

use std::collections::HashMap;

/// Coin id -> current price, as returned by a batched price lookup.
/// Identifiers the source could not price are simply absent.
pub type PriceMap = HashMap<String, f64>;
