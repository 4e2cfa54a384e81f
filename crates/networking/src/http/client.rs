//! CoinGecko HTTP client

use coindeck_core::{CoinRecord, Error, MarketChart, PriceMap, Result};
use coindeck_persistence::PriceCache;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

const API_BASE: &str = "https://api.coingecko.com/api/v3";
/// Header carrying the free-tier demo key, when one is configured
const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const USER_AGENT_VALUE: &str = "coindeck/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP client for the public CoinGecko API.
///
/// All methods map HTTP 429 to [`Error::RateLimited`], other non-2xx
/// statuses to [`Error::ApiError`], and transport failures to
/// [`Error::NetworkError`]; nothing here panics on a bad response.
/// Optionally feeds a shared last-known [`PriceCache`] so valuations
/// survive lookup outages.
pub struct CoinGeckoClient {
    http: Client,
    api_key: Option<String>,
    cache: Option<Arc<PriceCache>>,
}

impl CoinGeckoClient {
    /// Create a new client, with an optional demo API key.
    pub fn new(api_key: Option<&str>) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_key: api_key.map(str::to_string),
            cache: None,
        }
    }

    /// Create a new client with a shared last-known price cache.
    pub fn new_with_cache(api_key: Option<&str>, cache: Arc<PriceCache>) -> Self {
        let mut client = Self::new(api_key);
        client.cache = Some(cache);
        client
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            if let Ok(value) = HeaderValue::from_str(key) {
                headers.insert(API_KEY_HEADER, value);
            }
        }
        headers
    }

    /// Check if a response indicates throttling
    fn check_rate_limit(response: &Response) -> Option<Error> {
        (response.status().as_u16() == 429).then_some(Error::RateLimited)
    }

    /// Fetch one page of the market list, ordered by market cap
    /// descending, with 1h/24h/7d percentage-change windows attached.
    #[instrument(skip(self))]
    pub async fn markets(
        &self,
        vs_currency: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CoinRecord>> {
        let url = format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page={}&price_change_percentage=1h,24h,7d",
            API_BASE, vs_currency, per_page, page
        );

        debug!("Fetching market list from: {}", url);

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await?;

        if let Some(err) = Self::check_rate_limit(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Market request failed: {}", e);
            Error::ApiError(e.to_string())
        })?;

        let coins: Vec<CoinRecord> = response.json().await.map_err(|e| {
            error!("Failed to parse market response: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Market fetched: {} coins", coins.len());

        // Every market row carries a current price; remember them so
        // portfolio valuation has a fallback when /simple/price is down.
        if let Some(ref cache) = self.cache {
            for coin in &coins {
                if let Some(price) = coin.current_price {
                    cache.insert(&coin.id, price);
                }
            }
        }

        Ok(coins)
    }

    /// Fetch the (timestamp, price) series for one coin over `days` days.
    #[instrument(skip(self))]
    pub async fn market_chart(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            API_BASE,
            encode_query_component(id),
            vs_currency,
            days
        );

        debug!("Fetching chart from: {}", url);

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await?;

        if let Some(err) = Self::check_rate_limit(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Chart request failed for {}: {}", id, e);
            Error::ApiError(e.to_string())
        })?;

        let chart: MarketChart = response.json().await.map_err(|e| {
            error!("Failed to parse chart response for {}: {}", id, e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Chart fetched for {}: {} points", id, chart.prices.len());
        Ok(chart)
    }

    /// Batched price lookup. Ids the API does not know are simply
    /// absent from the result. An empty id list short-circuits to an
    /// empty map without touching the network.
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn simple_prices(&self, ids: &[String], vs_currency: &str) -> Result<PriceMap> {
        if ids.is_empty() {
            return Ok(PriceMap::new());
        }

        let joined = ids
            .iter()
            .map(|id| encode_query_component(id))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            API_BASE, joined, vs_currency
        );

        debug!("Fetching prices from: {}", url);

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await?;

        if let Some(err) = Self::check_rate_limit(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Price request failed: {}", e);
            Error::ApiError(e.to_string())
        })?;

        let raw: HashMap<String, HashMap<String, f64>> = response.json().await.map_err(|e| {
            error!("Failed to parse price response: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        let prices = flatten_simple_prices(raw, vs_currency);
        debug!("Prices fetched: {}/{} ids resolved", prices.len(), ids.len());

        if let Some(ref cache) = self.cache {
            cache.insert_many(&prices);
        }

        Ok(prices)
    }
}

/// Flatten the nested `/simple/price` shape `{id: {currency: price}}`
/// down to id -> price for the requested currency.
fn flatten_simple_prices(
    raw: HashMap<String, HashMap<String, f64>>,
    vs_currency: &str,
) -> PriceMap {
    raw.into_iter()
        .filter_map(|(id, currencies)| currencies.get(vs_currency).map(|p| (id, *p)))
        .collect()
}

/// Minimal percent-encoding for user-supplied coin ids in query strings
fn encode_query_component(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '&' => "%26".to_string(),
            '=' => "%3D".to_string(),
            '#' => "%23".to_string(),
            '?' => "%3F".to_string(),
            '/' => "%2F".to_string(),
            _ => c.to_string(),
        })
        .collect()
}
