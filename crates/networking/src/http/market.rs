//! Market-data and live ticker REST client

use super::{build_http_client, check_status_error, DEFAULT_REQUEST_TIMEOUT};
use mirror_core::{Error, MarketCoin, MarketQuery, Result, TickerQuote};
use mirror_persistence::MarketCache;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, error, instrument};

pub const DEFAULT_MARKET_API: &str = "https://api.coingecko.com/api/v3";

/// Client for the public market-data API and the ticker endpoint.
///
/// Optionally backed by a shared in-memory cache to stay under rate limits.
pub struct MarketDataClient {
    http: Client,
    api_base: String,
    cache: Option<Arc<MarketCache>>,
}

impl MarketDataClient {
    pub fn new(api_base: &str) -> Result<Self> {
        Ok(Self {
            http: build_http_client(DEFAULT_REQUEST_TIMEOUT)?,
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            cache: None,
        })
    }

    /// Create a client with a shared market cache
    pub fn new_with_cache(api_base: &str, cache: Arc<MarketCache>) -> Result<Self> {
        let mut client = Self::new(api_base)?;
        client.cache = Some(cache);
        Ok(client)
    }

    pub fn cache(&self) -> Option<&Arc<MarketCache>> {
        self.cache.as_ref()
    }

    /// Fetch a market listing (cache-aware)
    #[instrument(skip(self))]
    pub async fn fetch_markets(&self, query: &MarketQuery) -> Result<Vec<MarketCoin>> {
        let key = query.cache_key();
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.get(&key) {
                debug!("Cache hit for markets {}", key);
                return Ok(cached);
            }
        }

        let url = format!("{}/coins/markets", self.api_base);

        let response = self
            .http
            .get(&url)
            .query(&query.to_params())
            .send()
            .await?;

        if let Some(err) = check_status_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Markets request failed: {}", e);
            Error::Api(e.to_string())
        })?;

        let coins: Vec<MarketCoin> = response.json().await.map_err(|e| {
            error!("Failed to parse markets response: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Fetched {} coins for {}", coins.len(), key);

        if let Some(ref cache) = self.cache {
            cache.insert(&key, coins.clone());
        }

        Ok(coins)
    }

    /// Fetch ticker rows from an arbitrary endpoint returning a JSON array
    #[instrument(skip(self))]
    pub async fn fetch_ticker(&self, url: &str) -> Result<Vec<TickerQuote>> {
        let response = self.http.get(url).send().await?;

        if let Some(err) = check_status_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Ticker request failed: {}", e);
            Error::Api(e.to_string())
        })?;

        let body_text = response.text().await.map_err(|e| {
            error!("Failed to read ticker body: {}", e);
            Error::Network(e.to_string())
        })?;

        parse_ticker_body(&body_text)
    }
}

/// Accept either a bare array or `{ "data": [...] }`
fn parse_ticker_body(body: &str) -> Result<Vec<TickerQuote>> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        error!(
            "Failed to parse ticker: {}. Body preview: {}",
            e,
            body.chars().take(200).collect::<String>()
        );
        Error::InvalidData(e.to_string())
    })?;

    let rows = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map
            .remove("data")
            .ok_or_else(|| Error::InvalidData("ticker response has no data array".to_string()))?,
        _ => return Err(Error::InvalidData("ticker response is not a list".to_string())),
    };

    Ok(serde_json::from_value(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_ticker_shapes() {
        let bare = r#"[{"asset": "BTC/USDT", "price": 43250, "volume": 10, "change": 3.2, "timestamp": "t"}]"#;
        assert_eq!(parse_ticker_body(bare).unwrap()[0].asset, "BTC/USDT");

        let wrapped = r#"{"data": [{"asset": "ETH/USDT", "price": "2650.1"}]}"#;
        assert_eq!(parse_ticker_body(wrapped).unwrap()[0].price, 2650.1);

        assert!(matches!(
            parse_ticker_body(r#"{"error": "nope"}"#),
            Err(Error::InvalidData(_))
        ));
        assert!(parse_ticker_body("<html>").is_err());
    }

    #[tokio::test]
    async fn test_cached_listing_skips_network() {
        let cache = Arc::new(MarketCache::new(Duration::from_secs(60)));
        let query = MarketQuery::top(1);
        cache.insert(
            &query.cache_key(),
            vec![MarketCoin {
                id: "aptos".into(),
                name: "Aptos".into(),
                symbol: Some("apt".into()),
                current_price: 8.45,
                market_cap: 3.1e9,
                price_change_percentage_24h: Some(1.5),
                total_volume: None,
            }],
        );

        // Unroutable base: only the cache can answer
        let client = MarketDataClient::new_with_cache("http://127.0.0.1:9", cache).unwrap();
        let coins = client.fetch_markets(&query).await.unwrap();
        assert_eq!(coins[0].ticker(), "APT");
    }
}
