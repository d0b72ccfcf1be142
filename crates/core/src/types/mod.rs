//! Shared type definitions and newtypes

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Octas per APT (8 decimal places)
pub const OCTAS_PER_UNIT: f64 = 100_000_000.0;

/// Default published address of the mirror trading module
pub const DEFAULT_CONTRACT_ADDRESS: &str =
    "0x2f86cffa28b74ff5b04142c5c328368a6ce4763ae70137022a393d84a4ab3003";

/// Default module name of the mirror trading contract
pub const DEFAULT_MODULE_NAME: &str = "mirror_trading";

/// Shorten an address for display: `0x2f86...3003`
pub fn short_address(addr: &str) -> String {
    let chars: Vec<char> = addr.chars().collect();
    if chars.len() <= 10 {
        return addr.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Address of the connected wallet account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountAddress(String);

impl AccountAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        AccountAddress(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> String {
        short_address(&self.0)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of the wallet whose trades are copied
///
/// Only emptiness is checked; the contract is the authority on format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LeaderAddress(String);

impl LeaderAddress {
    /// Parse user input, trimming surrounding whitespace
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("leader address must not be empty"));
        }
        Ok(LeaderAddress(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> String {
        short_address(&self.0)
    }

    /// Whether the address looks like a 0x-prefixed hex account address
    pub fn looks_like_hex(&self) -> bool {
        let Some(hex) = self.0.strip_prefix("0x") else {
            return false;
        };
        !hex.is_empty() && hex.len() <= 64 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl TryFrom<String> for LeaderAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        LeaderAddress::parse(&value)
    }
}

impl From<LeaderAddress> for String {
    fn from(addr: LeaderAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for LeaderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction hash returned by the wallet on submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        TxHash(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit the contract expects for `max_trade_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountScale {
    /// Send the number as entered
    #[default]
    Whole,
    /// Multiply by 10^8 and send as an unsigned integer
    Octas,
}

impl std::str::FromStr for AmountScale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whole" => Ok(AmountScale::Whole),
            "octas" => Ok(AmountScale::Octas),
            other => Err(Error::validation(format!(
                "unknown amount scale '{}', expected 'whole' or 'octas'",
                other
            ))),
        }
    }
}

/// Where the mirror trading module lives and how it expects amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfig {
    pub address: String,
    pub module: String,
    #[serde(default)]
    pub amount_scale: AmountScale,
}

impl ContractConfig {
    pub fn new(address: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            module: module.into(),
            amount_scale: AmountScale::default(),
        }
    }

    pub fn with_amount_scale(mut self, scale: AmountScale) -> Self {
        self.amount_scale = scale;
        self
    }

    /// Fully qualified `address::module::name`
    pub fn function_id(&self, name: &str) -> String {
        format!("{}::{}::{}", self.address, self.module, name)
    }

    /// Fully qualified resource type holding follower registrations
    pub fn state_resource(&self) -> String {
        format!("{}::{}::MirrorState", self.address, self.module)
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONTRACT_ADDRESS, DEFAULT_MODULE_NAME)
    }
}
