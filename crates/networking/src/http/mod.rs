//! HTTP transport layer

mod client;

pub use client::CoinGeckoClient;
