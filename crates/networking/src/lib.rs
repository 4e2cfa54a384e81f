//! Coindeck Networking - CoinGecko HTTP client

pub mod http;

pub use http::CoinGeckoClient;
