//! Submitted transactions and their confirmations

use crate::types::TxHash;
use serde::{Deserialize, Serialize};

/// Returned by the wallet once a transaction has been accepted for submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: TxHash,
}

/// Final outcome of a committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub hash: TxHash,
    #[serde(default)]
    pub version: Option<u64>,
    pub success: bool,
    pub vm_status: String,
    #[serde(default)]
    pub gas_used: Option<u64>,
}

impl Confirmation {
    /// A successful confirmation with no ledger details
    pub fn executed(hash: TxHash) -> Self {
        Self {
            hash,
            version: None,
            success: true,
            vm_status: "Executed successfully".to_string(),
            gas_used: None,
        }
    }
}

// ============================================================================
// Fullnode REST transaction (GET /v1/transactions/by_hash/{hash})
// ============================================================================

/// Transaction as returned by the fullnode REST API.
///
/// Pending transactions carry no version/success fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTransaction {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub hash: String,
    #[serde(default, deserialize_with = "deserialize_u64_lenient")]
    pub version: Option<u64>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub vm_status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_u64_lenient")]
    pub gas_used: Option<u64>,
}

impl NodeTransaction {
    pub fn is_pending(&self) -> bool {
        self.tx_type == "pending_transaction"
    }

    /// Convert a committed transaction into a confirmation
    pub fn into_confirmation(self) -> Option<Confirmation> {
        if self.is_pending() {
            return None;
        }
        Some(Confirmation {
            hash: TxHash::new(self.hash),
            version: self.version,
            success: self.success.unwrap_or(false),
            vm_status: self.vm_status.unwrap_or_default(),
            gas_used: self.gas_used,
        })
    }
}

/// Deserialize an optional u64 that may arrive as a number or a decimal string
fn deserialize_u64_lenient<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct U64Lenient;

    impl<'de> de::Visitor<'de> for U64Lenient {
        type Value = Option<u64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a u64, a decimal string, or null")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Option<u64>, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Option<u64>, E> {
            u64::try_from(v).map(Some).map_err(de::Error::custom)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Option<u64>, E> {
            v.parse::<u64>().map(Some).map_err(de::Error::custom)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Option<u64>, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Option<u64>, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(U64Lenient)
}
