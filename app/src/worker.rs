//! Background fetch tasks
//!
//! All network work happens off the controller task and reports back
//! through [`AppEvent`]s. Two staleness guards keep slow responses from
//! clobbering newer state:
//!
//! - market and price results carry a sequence number; the controller
//!   applies a result only if it is newer than the last applied one
//!   (most recently started wins),
//! - chart requests get an explicit [`CancellationToken`] plus a
//!   request id; issuing a new chart request cancels the previous one,
//!   and any response that still slips through is dropped by id.

use coindeck_core::{CoinRecord, MarketChart, PriceMap, Result};
use coindeck_networking::CoinGeckoClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Results delivered to the controller task.
#[derive(Debug)]
pub enum AppEvent {
    Market {
        seq: u64,
        result: Result<Vec<CoinRecord>>,
    },
    Prices {
        seq: u64,
        result: Result<PriceMap>,
    },
    Chart {
        request_id: u64,
        coin_id: String,
        result: Result<MarketChart>,
    },
}

/// Tracks the newest issued request id so stale responses can be
/// recognized and dropped.
#[derive(Debug, Default)]
pub struct RequestGate {
    issued: u64,
}

impl RequestGate {
    /// Hand out the next request id.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// True only for the most recently issued request.
    pub fn is_current(&self, id: u64) -> bool {
        id == self.issued && id != 0
    }
}

/// Periodic market refresh. Fetches once immediately, then on every
/// interval tick; a message on `refresh_rx` forces an immediate fetch
/// and restarts the timer. Fetches are serialized by construction, and
/// each result carries its start-order sequence number anyway.
pub fn spawn_market_loop(
    client: Arc<CoinGeckoClient>,
    vs_currency: String,
    per_page: u32,
    every: Duration,
    cancel: CancellationToken,
    tx: mpsc::Sender<AppEvent>,
    mut refresh_rx: mpsc::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Market refresh loop started ({}s interval)", every.as_secs());
        let mut seq: u64 = 0;
        let mut interval = tokio::time::interval(every);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Market refresh loop cancelled, exiting");
                    return;
                }
                _ = interval.tick() => {}
                Some(()) = refresh_rx.recv() => {
                    debug!("Manual refresh requested");
                    interval.reset();
                }
            }

            seq += 1;
            let result = client.markets(&vs_currency, per_page, 1).await;
            if tx.send(AppEvent::Market { seq, result }).await.is_err() {
                return;
            }
        }
    })
}

/// One-shot batched price lookup for the portfolio.
pub fn spawn_price_lookup(
    client: Arc<CoinGeckoClient>,
    ids: Vec<String>,
    vs_currency: String,
    seq: u64,
    tx: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = client.simple_prices(&ids, &vs_currency).await;
        let _ = tx.send(AppEvent::Prices { seq, result }).await;
    });
}

/// Chart request issuer for the single chart view.
///
/// Holds the cancellation token of the in-flight request; a new request
/// cancels it, and any response already past the select is dropped by
/// the id gate in the controller.
pub struct ChartFetcher {
    client: Arc<CoinGeckoClient>,
    vs_currency: String,
    tx: mpsc::Sender<AppEvent>,
    gate: RequestGate,
    inflight: Option<CancellationToken>,
}

impl ChartFetcher {
    pub fn new(
        client: Arc<CoinGeckoClient>,
        vs_currency: String,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            client,
            vs_currency,
            tx,
            gate: RequestGate::default(),
            inflight: None,
        }
    }

    /// Issue a chart request, superseding any in-flight one.
    pub fn request(&mut self, coin_id: String, days: u32) -> u64 {
        let (token, request_id) = self.supersede();
        let client = self.client.clone();
        let vs_currency = self.vs_currency.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Chart request {} for {} superseded", request_id, coin_id);
                }
                result = client.market_chart(&coin_id, &vs_currency, days) => {
                    let _ = tx.send(AppEvent::Chart { request_id, coin_id, result }).await;
                }
            }
        });

        request_id
    }

    /// Cancel the in-flight request, if any, and set up the next one.
    fn supersede(&mut self) -> (CancellationToken, u64) {
        if let Some(prev) = self.inflight.take() {
            prev.cancel();
        }
        let token = CancellationToken::new();
        self.inflight = Some(token.clone());
        (token, self.gate.issue())
    }

    /// Should a delivered chart response still be applied?
    pub fn is_current(&self, request_id: u64) -> bool {
        self.gate.is_current(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_request_is_not_current() {
        let mut gate = RequestGate::default();
        let a = gate.issue();
        let b = gate.issue();
        assert!(!gate.is_current(a), "request A must be dropped once B is issued");
        assert!(gate.is_current(b));
    }

    #[test]
    fn unissued_id_is_never_current() {
        let gate = RequestGate::default();
        assert!(!gate.is_current(0));
    }

    #[test]
    fn new_chart_request_cancels_the_in_flight_one() {
        let client = Arc::new(CoinGeckoClient::new(None));
        let (tx, _rx) = mpsc::channel(8);
        let mut fetcher = ChartFetcher::new(client, "usd".to_string(), tx);

        let (first_token, first_id) = fetcher.supersede();
        let (second_token, second_id) = fetcher.supersede();

        assert!(first_token.is_cancelled());
        assert!(!second_token.is_cancelled());
        assert!(!fetcher.is_current(first_id));
        assert!(fetcher.is_current(second_id));
    }
}
