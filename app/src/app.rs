//! Controller: the single event-loop task
//!
//! Owns the [`App`] state and is the only place that mutates it. Input
//! keys and background fetch results arrive over channels; persistence
//! writes happen right after each mutation.

use crate::state::{App, Focus, InputMode, StatusLine};
use crate::tui::{map_key, render, Action};
use crate::worker::{spawn_price_lookup, AppEvent, ChartFetcher, RequestGate};
use chrono::Utc;
use coindeck_core::{Error, MarketSummary};
use coindeck_networking::CoinGeckoClient;
use coindeck_persistence::{PriceCache, StateStore};
use crossterm::event::KeyEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Controller {
    app: App,
    store: StateStore,
    client: Arc<CoinGeckoClient>,
    price_cache: Arc<PriceCache>,
    vs_currency: String,
    events_tx: mpsc::Sender<AppEvent>,
    chart: ChartFetcher,
    price_gate: RequestGate,
    market_seq_applied: u64,
    refresh_tx: mpsc::Sender<()>,
}

impl Controller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: StateStore,
        client: Arc<CoinGeckoClient>,
        price_cache: Arc<PriceCache>,
        vs_currency: String,
        events_tx: mpsc::Sender<AppEvent>,
        refresh_tx: mpsc::Sender<()>,
    ) -> Self {
        let mut app = App::default();
        app.favorites = store.load_favorites();
        app.portfolio = store.load_portfolio();
        info!(
            "Loaded client state: {} favorites, {} holdings",
            app.favorites.len(),
            app.portfolio.len()
        );

        let chart = ChartFetcher::new(client.clone(), vs_currency.clone(), events_tx.clone());
        Self {
            app,
            store,
            client,
            price_cache,
            vs_currency,
            events_tx,
            chart,
            price_gate: RequestGate::default(),
            market_seq_applied: 0,
            refresh_tx,
        }
    }

    /// Drive the terminal until the user quits or the token fires.
    pub async fn run(
        mut self,
        mut events_rx: mpsc::Receiver<AppEvent>,
        mut input_rx: mpsc::Receiver<KeyEvent>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut terminal = ratatui::init();

        let result = loop {
            if let Err(e) = terminal.draw(|frame| render(frame, &self.app)) {
                break Err(e.into());
            }

            tokio::select! {
                _ = cancel.cancelled() => break Ok(()),
                event = events_rx.recv() => match event {
                    Some(event) => self.apply_event(event),
                    None => break Ok(()),
                },
                key = input_rx.recv() => match key {
                    Some(key) => {
                        let action = map_key(self.app.input_mode, key);
                        self.handle_action(action);
                    }
                    None => break Ok(()),
                },
            }

            if self.app.should_quit {
                break Ok(());
            }
        };

        ratatui::restore();
        result
    }

    // Fetch results

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Market { seq, result } => {
                // A refresh in flight when the next tick fires may overlap;
                // only results newer than the last applied one count.
                if seq <= self.market_seq_applied {
                    debug!("Dropping stale market result (seq {})", seq);
                    return;
                }
                match result {
                    Ok(coins) => {
                        self.market_seq_applied = seq;
                        self.app.summary = Some(MarketSummary::from_coins(&coins));
                        self.app.coins = coins;
                        self.app.last_updated = Some(Utc::now());
                        self.app.clamp_selection();
                        if matches!(self.app.status, Some(StatusLine::Error(_))) {
                            self.app.status = None;
                        }
                        self.request_portfolio_prices();
                        self.revalue();
                    }
                    Err(e) => {
                        warn!("Market refresh failed: {}", e);
                        self.app.set_error(match e {
                            Error::RateLimited => {
                                "rate limited - will retry on next refresh".to_string()
                            }
                            e => format!("failed to load market data: {e}"),
                        });
                    }
                }
            }
            AppEvent::Prices { seq, result } => {
                if !self.price_gate.is_current(seq) {
                    debug!("Dropping superseded price lookup (seq {})", seq);
                    return;
                }
                match result {
                    // The client already fed the cache; valuation always
                    // reads the cache so both paths below are one line.
                    Ok(_) => self.revalue(),
                    Err(e) => {
                        warn!("Price lookup failed: {}", e);
                        // Oldest cached price among the holdings tells the
                        // user how stale the shown valuation is.
                        let age = self
                            .app
                            .portfolio
                            .coin_ids()
                            .iter()
                            .filter_map(|id| self.price_cache.age_secs(id))
                            .max();
                        self.app.set_error(match age {
                            Some(secs) => {
                                format!("price lookup failed - showing prices from {secs}s ago")
                            }
                            None => "price lookup failed - no prices known yet".to_string(),
                        });
                        self.revalue();
                    }
                }
            }
            AppEvent::Chart { request_id, coin_id, result } => {
                if !self.chart.is_current(request_id) {
                    debug!("Dropping superseded chart response for {}", coin_id);
                    return;
                }
                self.app.chart.loading = false;
                match result {
                    Ok(chart) => {
                        if chart.is_empty() {
                            self.app.set_info(format!("no chart data for {coin_id}"));
                        }
                        self.app.chart.chart = chart;
                    }
                    Err(e) => {
                        warn!("Chart fetch failed for {}: {}", coin_id, e);
                        self.app.set_error(format!("failed to load chart: {e}"));
                    }
                }
            }
        }
    }

    // User actions

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.app.should_quit = true,
            Action::NextTab => {
                let tab = self.app.view.tab.next();
                self.app.view.set_tab(tab);
                self.app.selected = 0;
            }
            Action::PrevTab => {
                let tab = self.app.view.tab.prev();
                self.app.view.set_tab(tab);
                self.app.selected = 0;
            }
            Action::MoveUp => self.app.move_selection(-1),
            Action::MoveDown => self.app.move_selection(1),
            Action::SwitchFocus => {
                self.app.focus = match self.app.focus {
                    Focus::Market => Focus::Portfolio,
                    Focus::Portfolio => Focus::Market,
                };
            }
            Action::Sort(key) => self.app.view.toggle_sort(key),
            Action::ToggleFavorite => self.toggle_favorite(),
            Action::OpenChart => self.open_chart(),
            Action::CycleChartDays => {
                self.app.chart.cycle_days();
                if let Some(id) = self.app.chart.coin_id.clone() {
                    self.app.chart.loading = true;
                    self.chart.request(id, self.app.chart.days);
                }
            }
            Action::StartSearch => {
                self.app.input_mode = InputMode::Search;
                self.app.input_buffer = self.app.view.query.clone();
            }
            Action::StartAddHolding => {
                self.app.input_mode = InputMode::AddHolding;
                self.app.input_buffer.clear();
            }
            Action::RemoveSelectedHolding => self.remove_selected_holding(),
            Action::Refresh => {
                let _ = self.refresh_tx.try_send(());
                self.app.set_info("refreshing...");
            }
            Action::InputChar(c) => {
                self.app.input_buffer.push(c);
                if self.app.input_mode == InputMode::Search {
                    self.app.view.query = self.app.input_buffer.clone();
                    self.app.clamp_selection();
                }
            }
            Action::InputBackspace => {
                self.app.input_buffer.pop();
                if self.app.input_mode == InputMode::Search {
                    self.app.view.query = self.app.input_buffer.clone();
                    self.app.clamp_selection();
                }
            }
            Action::InputSubmit => self.submit_input(),
            Action::InputCancel => {
                if self.app.input_mode == InputMode::Search {
                    self.app.view.query.clear();
                    self.app.clamp_selection();
                }
                self.app.input_mode = InputMode::Normal;
                self.app.input_buffer.clear();
            }
            Action::None => {}
        }
    }

    fn submit_input(&mut self) {
        match self.app.input_mode {
            InputMode::Search => {
                // Query already applied live while typing
                self.app.input_mode = InputMode::Normal;
                self.app.input_buffer.clear();
            }
            InputMode::AddHolding => {
                let line = self.app.input_buffer.trim().to_string();
                self.app.input_mode = InputMode::Normal;
                self.app.input_buffer.clear();
                self.add_holding(&line);
            }
            InputMode::Normal => {}
        }
    }

    /// Parse and validate a "coin amount" line; any rejection leaves
    /// the portfolio untouched.
    fn add_holding(&mut self, line: &str) {
        let mut parts = line.split_whitespace();
        let (Some(coin), Some(amount)) = (parts.next(), parts.next()) else {
            self.app.set_error("expected: <coin-id> <amount>");
            return;
        };
        let Ok(amount) = amount.parse::<f64>() else {
            self.app.set_error(format!("invalid amount: {amount}"));
            return;
        };

        let coin = coin.to_lowercase();
        let known = self.app.coins.iter().any(|c| c.id == coin)
            || self.price_cache.get(&coin).is_some();
        if !known {
            self.app.set_error(format!("unknown coin: {coin}"));
            return;
        }

        if let Err(e) = self.app.portfolio.add(coin.clone(), amount) {
            self.app.set_error(e.to_string());
            return;
        }
        self.persist_portfolio();
        self.request_portfolio_prices();
        self.revalue();
        self.app.set_info(format!("added {amount} {coin}"));
    }

    fn remove_selected_holding(&mut self) {
        if self.app.focus != Focus::Portfolio {
            return;
        }
        // Index is re-taken from the current list, never from a stale render
        let index = self.app.portfolio_selected;
        match self.app.portfolio.remove(index) {
            Ok(entry) => {
                self.persist_portfolio();
                self.revalue();
                self.app.clamp_selection();
                self.app.set_info(format!("removed {}", entry.coin));
            }
            Err(e) => self.app.set_error(e.to_string()),
        }
    }

    fn toggle_favorite(&mut self) {
        let Some(id) = self.app.selected_coin_id() else {
            return;
        };
        let now_favorite = self.app.favorites.toggle(&id);
        if let Err(e) = self.store.save_favorites(&self.app.favorites) {
            warn!("Failed to save favorites: {}", e);
            self.app.set_error(format!("could not save favorites: {e}"));
            return;
        }
        self.app.set_info(if now_favorite {
            format!("favorited {id}")
        } else {
            format!("unfavorited {id}")
        });
    }

    fn open_chart(&mut self) {
        let Some(id) = self.app.selected_coin_id() else {
            return;
        };
        self.app.chart.coin_id = Some(id.clone());
        self.app.chart.chart = Default::default();
        self.app.chart.loading = true;
        self.chart.request(id, self.app.chart.days);
    }

    fn persist_portfolio(&mut self) {
        if let Err(e) = self.store.save_portfolio(&self.app.portfolio) {
            warn!("Failed to save portfolio: {}", e);
            self.app.set_error(format!("could not save portfolio: {e}"));
        }
    }

    /// Full valuation pass against the last-known price cache. Never
    /// incremental, so removals and failed lookups cannot drift.
    fn revalue(&mut self) {
        let prices = self.price_cache.snapshot();
        self.app.valuation = self.app.portfolio.value_against(&prices);
        self.app.clamp_selection();
    }

    fn request_portfolio_prices(&mut self) {
        let ids = self.app.portfolio.coin_ids();
        if ids.is_empty() {
            return;
        }
        let seq = self.price_gate.issue();
        spawn_price_lookup(
            self.client.clone(),
            ids,
            self.vs_currency.clone(),
            seq,
            self.events_tx.clone(),
        );
    }
}
