//! coindeck: a terminal dashboard for crypto markets
//!
//! Pulls market data from CoinGecko on a timer, renders it with
//! ratatui, and keeps favorites and portfolio holdings on disk.

mod app;
mod state;
mod tui;
mod worker;

use crate::app::Controller;
use anyhow::Context;
use clap::Parser;
use coindeck_networking::CoinGeckoClient;
use coindeck_persistence::{PriceCache, StateStore};
use crossterm::event::{Event, KeyEventKind};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "coindeck", about = "Terminal dashboard for crypto markets")]
struct Args {
    /// Quote currency for prices and valuations
    #[arg(long, default_value = "usd")]
    vs_currency: String,

    /// Seconds between automatic market refreshes
    #[arg(long, default_value_t = 60)]
    refresh_secs: u64,

    /// Coins per market page
    #[arg(long, default_value_t = 50)]
    per_page: u32,

    /// Directory for favorites, portfolio and logs
    /// (default: the platform local data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// CoinGecko demo API key (falls back to COINGECKO_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

fn data_dir(args: &Args) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &args.data_dir {
        return Ok(dir.clone());
    }
    dirs_next::data_local_dir()
        .map(|d| d.join("coindeck"))
        .context("could not determine a local data directory; pass --data-dir")
}

/// Logs go to a file, never to the terminal the TUI owns.
fn init_tracing(dir: &std::path::Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    let log_file = std::fs::File::create(dir.join("coindeck.log"))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coindeck=info,coindeck_networking=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

/// Blocking crossterm reads on a plain thread, forwarded to the async
/// loop. Only key presses matter; repeats and releases are noise on
/// some terminals.
fn spawn_input_thread(tx: mpsc::Sender<crossterm::event::KeyEvent>) {
    std::thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if tx.blocking_send(key).is_err() {
                    return;
                }
            }
            Ok(_) => {}
            Err(_) => return,
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let dir = data_dir(&args)?;
    init_tracing(&dir)?;
    info!("Starting coindeck (data dir {})", dir.display());

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("COINGECKO_API_KEY").ok());

    let store = StateStore::new(dir)?;
    let price_cache = Arc::new(PriceCache::new());
    let client = Arc::new(CoinGeckoClient::new_with_cache(
        api_key.as_deref(),
        price_cache.clone(),
    ));

    let (events_tx, events_rx) = mpsc::channel(64);
    let (input_tx, input_rx) = mpsc::channel(64);
    let (refresh_tx, refresh_rx) = mpsc::channel(4);
    let cancel = CancellationToken::new();

    spawn_input_thread(input_tx);
    let market_loop = worker::spawn_market_loop(
        client.clone(),
        args.vs_currency.clone(),
        args.per_page,
        Duration::from_secs(args.refresh_secs.max(5)),
        cancel.clone(),
        events_tx.clone(),
        refresh_rx,
    );

    let controller = Controller::new(
        store,
        client,
        price_cache,
        args.vs_currency,
        events_tx,
        refresh_tx,
    );
    let result = controller.run(events_rx, input_rx, cancel.clone()).await;

    cancel.cancel();
    let _ = market_loop.await;
    info!("Shut down cleanly");
    result
}
