//! HTTP clients for the fullnode and market-data collaborators

mod client;
mod market;

pub use client::{LedgerInfo, NodeClient, DEFAULT_NODE_URL};
pub use market::{MarketDataClient, DEFAULT_MARKET_API};

use mirror_core::{Error, Result};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

const USER_AGENT_VALUE: &str = concat!("mirror-shell/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for all outbound calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT_VALUE)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Network(format!("failed to create HTTP client: {}", e)))
}

/// Map throttling and server failures before the body is parsed
fn check_status_error(response: &Response) -> Option<Error> {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => Some(Error::Api("rate limited (HTTP 429)".to_string())),
        status if status.is_server_error() => Some(Error::Api(format!("HTTP {}", status))),
        _ => None,
    }
}
