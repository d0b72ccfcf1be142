//! Statistics panel data

use crate::MarketDataClient;
use mirror_core::{Error, MarketCoin, MarketQuery, Result};
use tracing::info;

/// Largest page the markets endpoint serves
pub const MAX_PAGE_SIZE: u32 = 250;

/// Top coins by market cap, in market-cap order
pub async fn top_coins(client: &MarketDataClient, limit: u32) -> Result<Vec<MarketCoin>> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(Error::validation(format!(
            "limit must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, limit
        )));
    }

    let coins = client.fetch_markets(&MarketQuery::top(limit)).await?;
    info!("Loaded statistics for {} coins", coins.len());
    Ok(coins)
}

/// Sum of market caps over a listing
pub fn total_market_cap(coins: &[MarketCoin]) -> f64 {
    coins.iter().map(|c| c.market_cap).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_is_validated_before_network() {
        let client = MarketDataClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(top_coins(&client, 0).await, Err(Error::Validation(_))));
        assert!(matches!(top_coins(&client, 251).await, Err(Error::Validation(_))));
    }

    #[test]
    fn test_total_market_cap() {
        let coin = |cap: f64| MarketCoin {
            id: "x".into(),
            name: "x".into(),
            symbol: None,
            current_price: 1.0,
            market_cap: cap,
            price_change_percentage_24h: None,
            total_volume: None,
        };
        assert_eq!(total_market_cap(&[coin(1.5), coin(2.5)]), 4.0);
        assert_eq!(total_market_cap(&[]), 0.0);
    }
}
