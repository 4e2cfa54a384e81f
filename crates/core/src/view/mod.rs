//! Table view model
//!
//! Pure functions from (coin list, view state) to the ordered, filtered
//! row set. No I/O and no UI types here; the terminal layer renders
//! whatever this module produces, which keeps the ordering rules
//! independently testable.

use crate::models::CoinRecord;
use serde::{Deserialize, Serialize};

/// Sortable table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Price,
    MarketCap,
    Change1h,
    Change24h,
    Change7d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Named predefined view over the coin list: a base ordering plus an
/// optional filter. Exactly one tab is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Top,
    Trending,
    Watchlist,
    Prediction,
    MostVisited,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Top,
        Tab::Trending,
        Tab::Watchlist,
        Tab::Prediction,
        Tab::MostVisited,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Top => "Top",
            Tab::Trending => "Trending",
            Tab::Watchlist => "Watchlist",
            Tab::Prediction => "Prediction",
            Tab::MostVisited => "Most Visited",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// User-controlled view parameters for the market table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewState {
    pub query: String,
    /// Explicit sort, if any. When set it overrides the tab ordering.
    pub sort: Option<(SortKey, SortDirection)>,
    pub tab: Tab,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: None,
            tab: Tab::Top,
        }
    }
}

impl ViewState {
    /// Toggle sorting on a column: re-selecting the active key flips the
    /// direction, selecting a new key starts descending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = match self.sort {
            Some((active, dir)) if active == key => Some((key, dir.flipped())),
            _ => Some((key, SortDirection::Descending)),
        };
    }

    /// Switching tabs drops the explicit sort so the tab's own ordering
    /// shows through.
    pub fn set_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.sort = None;
        }
    }
}

/// Rank cutoff for the "Most Visited" tab.
const MOST_VISITED_MAX_RANK: u32 = 20;

/// Compute the visible rows: categorize by tab, filter by query, then
/// apply the explicit sort if one is active.
///
/// Returns references into `coins` in render order; an empty input
/// yields an empty output (the caller draws a "no data" placeholder).
/// Missing numeric fields compare as 0 and never fail. All sorts are
/// stable, so ties keep their prior relative order.
pub fn visible_rows<'a>(coins: &'a [CoinRecord], view: &ViewState) -> Vec<&'a CoinRecord> {
    let mut rows: Vec<&CoinRecord> = match view.tab {
        Tab::MostVisited => coins
            .iter()
            .filter(|c| c.market_cap_rank.is_some_and(|r| r <= MOST_VISITED_MAX_RANK))
            .collect(),
        _ => coins.iter().collect(),
    };

    match view.tab {
        Tab::Top => sort_desc(&mut rows, CoinRecord::market_cap_or_zero),
        Tab::Trending => sort_desc(&mut rows, |c| c.change_24h.unwrap_or(0.0)),
        Tab::Watchlist => sort_desc(&mut rows, CoinRecord::volume_or_zero),
        Tab::Prediction => sort_desc(&mut rows, |c| c.change_24h.unwrap_or(0.0).abs()),
        Tab::MostVisited => {}
    }

    if !view.query.trim().is_empty() {
        rows.retain(|c| c.matches(&view.query));
    }

    if let Some((key, dir)) = view.sort {
        apply_sort(&mut rows, key, dir);
    }

    rows
}

fn sort_desc(rows: &mut [&CoinRecord], metric: impl Fn(&CoinRecord) -> f64) {
    rows.sort_by(|a, b| metric(b).total_cmp(&metric(a)));
}

fn apply_sort(rows: &mut [&CoinRecord], key: SortKey, dir: SortDirection) {
    match key {
        SortKey::Name => rows.sort_by(|a, b| {
            let ord = a.name.to_lowercase().cmp(&b.name.to_lowercase());
            match dir {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }),
        _ => {
            let metric = |c: &CoinRecord| -> f64 {
                match key {
                    SortKey::Price => c.price_or_zero(),
                    SortKey::MarketCap => c.market_cap_or_zero(),
                    SortKey::Change1h => c.change_1h.unwrap_or(0.0),
                    SortKey::Change24h => c.change_24h.unwrap_or(0.0),
                    SortKey::Change7d => c.change_7d.unwrap_or(0.0),
                    SortKey::Name => unreachable!("handled above"),
                }
            };
            rows.sort_by(|a, b| {
                let ord = metric(a).total_cmp(&metric(b));
                match dir {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(
        id: &str,
        name: &str,
        symbol: &str,
        price: f64,
        cap: f64,
        volume: f64,
        rank: Option<u32>,
        change_24h: Option<f64>,
    ) -> CoinRecord {
        CoinRecord {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            image: None,
            current_price: Some(price),
            market_cap: Some(cap),
            market_cap_rank: rank,
            total_volume: Some(volume),
            change_1h: None,
            change_24h,
            change_7d: None,
        }
    }

    fn sample() -> Vec<CoinRecord> {
        vec![
            coin("bitcoin", "Bitcoin", "btc", 43000.0, 800e9, 18e9, Some(1), Some(2.0)),
            coin("ethereum", "Ethereum", "eth", 2300.0, 280e9, 9e9, Some(2), Some(-1.5)),
            coin("solana", "Solana", "sol", 98.0, 42e9, 3e9, Some(5), Some(5.0)),
            coin("pepe", "Pepe", "pepe", 0.000001, 4e8, 2e8, Some(90), Some(-8.0)),
        ]
    }

    fn ids<'a>(rows: &[&'a CoinRecord]) -> Vec<&'a str> {
        rows.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn empty_query_is_a_no_op_filter() {
        let coins = sample();
        let mut view = ViewState::default();
        let all = visible_rows(&coins, &view);
        assert_eq!(all.len(), coins.len());

        view.query = "   ".to_string();
        assert_eq!(ids(&visible_rows(&coins, &view)), ids(&all));
    }

    #[test]
    fn filter_is_neither_lossy_nor_leaky() {
        let coins = sample();
        let view = ViewState {
            query: "So".to_string(),
            ..ViewState::default()
        };
        let rows = visible_rows(&coins, &view);

        // Every visible row matches the query
        for row in &rows {
            assert!(row.matches("So"), "leaked row {}", row.id);
        }
        // Every matching input row is visible
        let visible: Vec<&str> = ids(&rows);
        for c in coins.iter().filter(|c| c.matches("So")) {
            assert!(visible.contains(&c.id.as_str()), "lost row {}", c.id);
        }
    }

    #[test]
    fn top_tab_orders_by_market_cap_desc() {
        let coins = sample();
        let view = ViewState::default();
        assert_eq!(
            ids(&visible_rows(&coins, &view)),
            vec!["bitcoin", "ethereum", "solana", "pepe"]
        );
    }

    #[test]
    fn trending_tab_orders_by_24h_change_desc() {
        let coins = sample();
        let view = ViewState {
            tab: Tab::Trending,
            ..ViewState::default()
        };
        assert_eq!(
            ids(&visible_rows(&coins, &view)),
            vec!["solana", "bitcoin", "ethereum", "pepe"]
        );
    }

    #[test]
    fn prediction_tab_orders_by_absolute_change() {
        let coins = sample();
        let view = ViewState {
            tab: Tab::Prediction,
            ..ViewState::default()
        };
        assert_eq!(
            ids(&visible_rows(&coins, &view)),
            vec!["pepe", "solana", "bitcoin", "ethereum"]
        );
    }

    #[test]
    fn most_visited_tab_keeps_only_top_ranks() {
        let mut coins = sample();
        coins.push(coin("unranked", "Unranked", "unr", 1.0, 1.0, 1.0, None, None));
        let view = ViewState {
            tab: Tab::MostVisited,
            ..ViewState::default()
        };
        assert_eq!(
            ids(&visible_rows(&coins, &view)),
            vec!["bitcoin", "ethereum", "solana"]
        );
    }

    #[test]
    fn toggling_a_numeric_sort_reverses_the_order() {
        let coins = sample();
        let mut view = ViewState::default();
        view.toggle_sort(SortKey::Price);
        let first = ids(&visible_rows(&coins, &view));
        view.toggle_sort(SortKey::Price);
        let second = ids(&visible_rows(&coins, &view));

        let mut reversed = first.clone();
        reversed.reverse();
        assert_eq!(second, reversed);
    }

    #[test]
    fn new_sort_key_defaults_to_descending() {
        let mut view = ViewState::default();
        view.toggle_sort(SortKey::Change24h);
        assert_eq!(view.sort, Some((SortKey::Change24h, SortDirection::Descending)));
        view.toggle_sort(SortKey::Price);
        assert_eq!(view.sort, Some((SortKey::Price, SortDirection::Descending)));
    }

    #[test]
    fn missing_change_sorts_as_zero() {
        let coins = vec![
            coin("up", "Up", "up", 1.0, 1.0, 1.0, None, Some(5.0)),
            coin("none", "None", "non", 1.0, 1.0, 1.0, None, None),
            coin("down", "Down", "dwn", 1.0, 1.0, 1.0, None, Some(-3.0)),
        ];
        let mut view = ViewState::default();
        view.toggle_sort(SortKey::Change24h);
        assert_eq!(ids(&visible_rows(&coins, &view)), vec!["up", "none", "down"]);
    }

    #[test]
    fn explicit_sort_overrides_tab_ordering() {
        let coins = sample();
        let mut view = ViewState {
            tab: Tab::Trending,
            ..ViewState::default()
        };
        view.toggle_sort(SortKey::Name);
        view.toggle_sort(SortKey::Name); // ascending
        assert_eq!(
            ids(&visible_rows(&coins, &view)),
            vec!["bitcoin", "ethereum", "pepe", "solana"]
        );
    }

    #[test]
    fn switching_tabs_clears_the_sort() {
        let mut view = ViewState::default();
        view.toggle_sort(SortKey::Price);
        view.set_tab(Tab::Trending);
        assert_eq!(view.sort, None);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let view = ViewState::default();
        assert!(visible_rows(&[], &view).is_empty());
    }
}
