//! Fullnode REST client: transaction confirmation and account resources

use super::{build_http_client, check_status_error, DEFAULT_REQUEST_TIMEOUT};
use mirror_core::{Confirmation, Error, NodeTransaction, Result, TxHash};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// Subset of `GET /v1` ledger information
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerInfo {
    pub chain_id: u8,
    pub ledger_version: String,
    #[serde(default)]
    pub ledger_timestamp: Option<String>,
}

/// Client for the chain's fullnode REST API
pub struct NodeClient {
    http: Client,
    api_base: String,
    poll_interval: Duration,
    confirm_timeout: Duration,
}

impl NodeClient {
    /// Create a client for a fullnode, with or without the trailing `/v1`
    pub fn new(node_url: &str) -> Result<Self> {
        Ok(Self {
            http: build_http_client(DEFAULT_REQUEST_TIMEOUT)?,
            api_base: api_base(node_url),
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        })
    }

    /// Override confirmation polling cadence and deadline
    pub fn with_timing(mut self, poll_interval: Duration, confirm_timeout: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(50));
        self.confirm_timeout = confirm_timeout;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn confirm_timeout(&self) -> Duration {
        self.confirm_timeout
    }

    /// Ledger info, used as a health probe
    #[instrument(skip(self))]
    pub async fn ledger_info(&self) -> Result<LedgerInfo> {
        let response = self.http.get(&self.api_base).send().await?;

        if let Some(err) = check_status_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Ledger info request failed: {}", e);
            Error::Api(e.to_string())
        })?;

        response.json().await.map_err(|e| {
            error!("Failed to parse ledger info: {}", e);
            Error::InvalidData(e.to_string())
        })
    }

    /// Look up a transaction. `None` if the node has not seen it yet.
    #[instrument(skip(self))]
    pub async fn get_transaction_by_hash(&self, hash: &TxHash) -> Result<Option<NodeTransaction>> {
        let url = format!("{}/transactions/by_hash/{}", self.api_base, hash);

        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if let Some(err) = check_status_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Transaction lookup failed: {}", e);
            Error::Api(e.to_string())
        })?;

        let tx: NodeTransaction = response.json().await.map_err(|e| {
            error!("Failed to parse transaction {}: {}", hash, e);
            Error::InvalidData(e.to_string())
        })?;

        Ok(Some(tx))
    }

    /// Poll until the transaction is committed.
    ///
    /// Every failure here, including the deadline and a committed-but-aborted
    /// transaction, is a chain error: the wallet already accepted the submission.
    #[instrument(skip(self))]
    pub async fn wait_for_transaction(&self, hash: &TxHash) -> Result<Confirmation> {
        let deadline = Instant::now() + self.confirm_timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.get_transaction_by_hash(hash).await {
                Ok(Some(tx)) => {
                    if let Some(confirmation) = tx.into_confirmation() {
                        debug!(
                            "Transaction {} committed after {} polls (version {:?})",
                            hash, attempts, confirmation.version
                        );
                        return committed_outcome(confirmation);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Polling {} failed (attempt {}): {}", hash, attempts, e),
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(Error::Chain(format!(
                    "timed out after {:?} waiting for {}",
                    self.confirm_timeout, hash
                )));
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Fetch a Move resource under an account. `None` if absent.
    #[instrument(skip(self))]
    pub async fn get_account_resource(
        &self,
        address: &str,
        resource_type: &str,
    ) -> Result<Option<serde_json::Value>> {
        let url = format!(
            "{}/accounts/{}/resource/{}",
            self.api_base, address, resource_type
        );

        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Resource {} not found under {}", resource_type, address);
            return Ok(None);
        }
        if let Some(err) = check_status_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Resource request failed: {}", e);
            Error::Api(e.to_string())
        })?;

        let body: serde_json::Value = response.json().await.map_err(|e| {
            error!("Failed to parse resource {}: {}", resource_type, e);
            Error::InvalidData(e.to_string())
        })?;

        Ok(Some(body))
    }
}

/// A committed transaction that aborted is still a failure
fn committed_outcome(confirmation: Confirmation) -> Result<Confirmation> {
    if confirmation.success {
        Ok(confirmation)
    } else {
        Err(Error::Chain(format!(
            "transaction {} failed: {}",
            confirmation.hash, confirmation.vm_status
        )))
    }
}

/// Normalize a node URL to its `/v1` API root
fn api_base(node_url: &str) -> String {
    let trimmed = node_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_normalization() {
        assert_eq!(
            api_base("https://fullnode.testnet.aptoslabs.com"),
            "https://fullnode.testnet.aptoslabs.com/v1"
        );
        assert_eq!(api_base("http://localhost:8080/v1/"), "http://localhost:8080/v1");
    }

    #[test]
    fn test_poll_interval_floor() {
        let client = NodeClient::new(DEFAULT_NODE_URL)
            .unwrap()
            .with_timing(Duration::ZERO, Duration::from_secs(2));
        assert_eq!(client.poll_interval, Duration::from_millis(50));
        assert_eq!(client.confirm_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_aborted_commit_is_chain_error() {
        let ok = Confirmation::executed(TxHash::new("0xa"));
        assert_eq!(committed_outcome(ok.clone()), Ok(ok.clone()));

        let aborted = Confirmation {
            success: false,
            vm_status: "Move abort".into(),
            ..ok
        };
        assert_eq!(
            committed_outcome(aborted),
            Err(Error::Chain("transaction 0xa failed: Move abort".into()))
        );
    }

    #[test]
    fn test_ledger_info_shape() {
        let info: LedgerInfo = serde_json::from_value(serde_json::json!({
            "chain_id": 2,
            "epoch": "9001",
            "ledger_version": "123456789",
            "ledger_timestamp": "1700000000000000",
            "node_role": "full_node"
        }))
        .unwrap();
        assert_eq!(info.chain_id, 2);
        assert_eq!(info.ledger_version, "123456789");
    }

    #[tokio::test]
    async fn test_unreachable_node_fails_health_check() {
        let client = NodeClient::new("http://127.0.0.1:9").unwrap();
        let err = client.ledger_info().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_unreachable_node_times_out_as_chain_error() {
        // Port 9 on localhost refuses connections; every poll fails fast
        let client = NodeClient::new("http://127.0.0.1:9")
            .unwrap()
            .with_timing(Duration::from_millis(50), Duration::from_millis(200));
        let err = client
            .wait_for_transaction(&TxHash::new("0xabc"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Chain(_)), "{:?}", err);
    }
}
