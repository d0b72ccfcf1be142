//! On-chain follower registry lookup

use crate::NodeClient;
use mirror_core::{AccountAddress, ContractConfig, Result};
use serde_json::Value;
use tracing::{debug, info};

/// Whether `follower` is registered in the contract's `MirrorState`.
///
/// Informational only: local follow state moves on confirmed submissions,
/// never on this lookup.
pub async fn is_following(
    client: &NodeClient,
    contract: &ContractConfig,
    follower: &AccountAddress,
) -> Result<bool> {
    let resource_type = contract.state_resource();
    let Some(resource) = client
        .get_account_resource(&contract.address, &resource_type)
        .await?
    else {
        info!("No MirrorState published at {}", contract.address);
        return Ok(false);
    };

    let found = followers_contains(&resource, follower.as_str());
    debug!("Follower {} registered: {}", follower.short(), found);
    Ok(found)
}

/// Search the `followers` field of a MirrorState resource.
///
/// Handles a JSON object keyed by address, a `SimpleMap` (`{data: [{key, value}]}`)
/// and a plain vector of addresses.
pub fn followers_contains(resource: &Value, follower: &str) -> bool {
    let data = resource.get("data").unwrap_or(resource);
    let Some(followers) = data.get("followers") else {
        return false;
    };
    let wanted = normalize_address(follower);

    match followers {
        Value::Object(map) => {
            if let Some(Value::Array(entries)) = map.get("data") {
                entries.iter().any(|entry| {
                    entry
                        .get("key")
                        .and_then(Value::as_str)
                        .is_some_and(|key| normalize_address(key) == wanted)
                })
            } else {
                map.keys().any(|key| normalize_address(key) == wanted)
            }
        }
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|addr| normalize_address(addr) == wanted),
        _ => false,
    }
}

/// Lower-case, drop the `0x` prefix and leading zeros so short and long forms compare equal
fn normalize_address(addr: &str) -> String {
    let lower = addr.trim().to_ascii_lowercase();
    let hex = lower.strip_prefix("0x").unwrap_or(&lower);
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
