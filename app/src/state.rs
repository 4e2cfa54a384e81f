//! Application state
//!
//! One owned state object, mutated only by the controller between
//! awaits on the single event-loop task. The render layer reads it,
//! never writes it.

use chrono::{DateTime, Utc};
use coindeck_core::{
    visible_rows, CoinRecord, FavoriteSet, MarketChart, MarketSummary, Portfolio,
    PortfolioValuation, ViewState,
};

/// Which panel owns up/down selection and Enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Market,
    Portfolio,
}

/// Keyboard interpretation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Editing the search query (live filter)
    Search,
    /// Editing a "coin amount" line for a new holding
    AddHolding,
}

/// One-line feedback at the bottom of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Info(String),
    Error(String),
}

/// Chart panel state, scoped to the single chart view.
#[derive(Debug, Clone)]
pub struct ChartView {
    pub coin_id: Option<String>,
    pub days: u32,
    pub chart: MarketChart,
    pub loading: bool,
}

impl Default for ChartView {
    fn default() -> Self {
        Self {
            coin_id: None,
            days: 7,
            chart: MarketChart::default(),
            loading: false,
        }
    }
}

const CHART_DAY_CHOICES: [u32; 3] = [1, 7, 30];

impl ChartView {
    pub fn cycle_days(&mut self) {
        let idx = CHART_DAY_CHOICES
            .iter()
            .position(|d| *d == self.days)
            .unwrap_or(0);
        self.days = CHART_DAY_CHOICES[(idx + 1) % CHART_DAY_CHOICES.len()];
    }
}

/// Everything the dashboard shows, in one place.
pub struct App {
    /// Latest market snapshot, replaced wholesale on each refresh
    pub coins: Vec<CoinRecord>,
    pub summary: Option<MarketSummary>,
    pub view: ViewState,
    pub favorites: FavoriteSet,
    pub portfolio: Portfolio,
    pub valuation: PortfolioValuation,
    pub chart: ChartView,
    pub focus: Focus,
    pub input_mode: InputMode,
    /// Line being edited in Search/AddHolding mode
    pub input_buffer: String,
    pub selected: usize,
    pub portfolio_selected: usize,
    pub status: Option<StatusLine>,
    pub last_updated: Option<DateTime<Utc>>,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            coins: Vec::new(),
            summary: None,
            view: ViewState::default(),
            favorites: FavoriteSet::default(),
            portfolio: Portfolio::default(),
            valuation: PortfolioValuation::default(),
            chart: ChartView::default(),
            focus: Focus::Market,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            selected: 0,
            portfolio_selected: 0,
            status: None,
            last_updated: None,
            should_quit: false,
        }
    }
}

impl App {
    /// The ordered, filtered market rows for the current view.
    pub fn visible(&self) -> Vec<&CoinRecord> {
        visible_rows(&self.coins, &self.view)
    }

    /// Coin id under the cursor in the focused panel, if any.
    pub fn selected_coin_id(&self) -> Option<String> {
        match self.focus {
            Focus::Market => self
                .visible()
                .get(self.selected)
                .map(|c| c.id.clone()),
            Focus::Portfolio => self
                .valuation
                .lines
                .get(self.portfolio_selected)
                .map(|l| l.coin.clone()),
        }
    }

    /// Keep both cursors inside their lists after any mutation.
    pub fn clamp_selection(&mut self) {
        let rows = self.visible().len();
        self.selected = self.selected.min(rows.saturating_sub(1));
        let lines = self.valuation.lines.len();
        self.portfolio_selected = self.portfolio_selected.min(lines.saturating_sub(1));
    }

    pub fn move_selection(&mut self, delta: i64) {
        let (cursor, len) = match self.focus {
            Focus::Market => (&mut self.selected, self.coins.len()),
            Focus::Portfolio => (&mut self.portfolio_selected, self.valuation.lines.len()),
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        let next = (*cursor as i64 + delta).clamp(0, len as i64 - 1);
        *cursor = next as usize;
        // Market cursor moves over the filtered rows, not the raw list
        if self.focus == Focus::Market {
            self.clamp_selection();
        }
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.status = Some(StatusLine::Info(message.into()));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = Some(StatusLine::Error(message.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_days_cycle() {
        let mut chart = ChartView::default();
        assert_eq!(chart.days, 7);
        chart.cycle_days();
        assert_eq!(chart.days, 30);
        chart.cycle_days();
        assert_eq!(chart.days, 1);
        chart.cycle_days();
        assert_eq!(chart.days, 7);
    }

    #[test]
    fn selection_clamps_to_visible_rows() {
        let mut app = App::default();
        app.selected = 10;
        app.clamp_selection();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn move_selection_on_empty_lists_stays_at_zero() {
        let mut app = App::default();
        app.move_selection(1);
        assert_eq!(app.selected, 0);
        app.focus = Focus::Portfolio;
        app.move_selection(-1);
        assert_eq!(app.portfolio_selected, 0);
    }
}
