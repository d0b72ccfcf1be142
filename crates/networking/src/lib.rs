//! Mirror Networking - Fullnode and market-data HTTP clients

pub mod api;
pub mod http;

pub use http::{MarketDataClient, NodeClient};
