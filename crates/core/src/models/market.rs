//! Market data models

use serde::{Deserialize, Serialize};

/// Coin row from `GET /coins/markets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    pub current_price: f64,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    pub market_cap: f64,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
}

impl MarketCoin {
    /// Symbol in upper case, falling back to the id
    pub fn ticker(&self) -> String {
        self.symbol
            .as_deref()
            .unwrap_or(&self.id)
            .to_uppercase()
    }
}

/// Sort order accepted by the markets endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketOrder {
    MarketCapDesc,
    MarketCapAsc,
    VolumeDesc,
}

impl MarketOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketOrder::MarketCapDesc => "market_cap_desc",
            MarketOrder::MarketCapAsc => "market_cap_asc",
            MarketOrder::VolumeDesc => "volume_desc",
        }
    }
}

/// Query parameters for the markets endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    pub vs_currency: String,
    pub order: MarketOrder,
    pub per_page: u32,
    pub page: u32,
    pub sparkline: bool,
}

impl Default for MarketQuery {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            order: MarketOrder::MarketCapDesc,
            per_page: 10,
            page: 1,
            sparkline: false,
        }
    }
}

impl MarketQuery {
    pub fn top(per_page: u32) -> Self {
        Self {
            per_page,
            ..Self::default()
        }
    }

    /// Stable key for caching responses to this query
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.vs_currency,
            self.order.as_str(),
            self.per_page,
            self.page,
            self.sparkline
        )
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vs_currency", self.vs_currency.clone()),
            ("order", self.order.as_str().to_string()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("sparkline", self.sparkline.to_string()),
        ]
    }
}

/// Row of the live trading ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerQuote {
    pub asset: String,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    pub price: f64,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    pub volume: f64,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    pub change: f64,
    #[serde(default)]
    pub timestamp: String,
}

impl TickerQuote {
    pub fn is_up(&self) -> bool {
        self.change >= 0.0
    }
}

/// Latest ticker rows and when they were fetched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerSnapshot {
    pub quotes: Vec<TickerQuote>,
    pub fetched_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Last poll failed; `quotes` are from an earlier successful poll
    pub stale: bool,
}

/// Deserialize an f64 that may arrive as a number, string, or null
fn deserialize_f64_lenient<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct F64Lenient;

    impl<'de> de::Visitor<'de> for F64Lenient {
        type Value = f64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, string, or null")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<f64, E> {
            v.parse::<f64>().map_err(de::Error::custom)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<f64, E> {
            Ok(0.0)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<f64, E> {
            Ok(0.0)
        }
    }

    deserializer.deserialize_any(F64Lenient)
}
