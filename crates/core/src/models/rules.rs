//! Copy-trading rule set

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// User-configured constraints governing mirrored trade execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    /// Largest single mirrored trade, in the unit the contract is configured for
    pub max_trade_size: f64,
    /// Token symbols the follower is willing to trade
    pub allowed_tokens: Vec<String>,
    /// Seconds to wait before mirroring a leader trade
    pub delay_seconds: u64,
    /// Loss percentage at which mirrored positions are closed
    pub stop_loss_percent: f64,
    pub enabled: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            max_trade_size: 100.0,
            allowed_tokens: vec!["APT".to_string(), "USDC".to_string(), "USDT".to_string()],
            delay_seconds: 5,
            stop_loss_percent: 10.0,
            enabled: true,
        }
    }
}

impl RuleSet {
    /// Check every field; nothing may be submitted unless this passes
    pub fn validate(&self) -> Result<()> {
        if !self.max_trade_size.is_finite() || self.max_trade_size <= 0.0 {
            return Err(Error::validation(format!(
                "max trade size must be a positive number, got {}",
                self.max_trade_size
            )));
        }

        if self.allowed_tokens.is_empty() {
            return Err(Error::validation("at least one allowed token is required"));
        }
        if let Some(bad) = self.allowed_tokens.iter().find(|t| !is_valid_symbol(t)) {
            return Err(Error::validation(format!("invalid token symbol '{}'", bad)));
        }
        if let Some(bad) = self
            .allowed_tokens
            .iter()
            .find(|t| t.as_str() != t.trim().to_uppercase())
        {
            return Err(Error::validation(format!(
                "token symbol '{}' must be trimmed upper case",
                bad
            )));
        }
        for (i, token) in self.allowed_tokens.iter().enumerate() {
            if self.allowed_tokens[..i].contains(token) {
                return Err(Error::validation(format!("duplicate token symbol '{}'", token)));
            }
        }

        if !self.stop_loss_percent.is_finite()
            || self.stop_loss_percent <= 0.0
            || self.stop_loss_percent > 100.0
        {
            return Err(Error::validation(format!(
                "stop loss must be in (0, 100], got {}",
                self.stop_loss_percent
            )));
        }

        Ok(())
    }

    /// Replace the token list, normalizing symbols
    pub fn set_tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_tokens = normalize_tokens(tokens);
    }

    /// Add a token if not already present. Returns false for blanks and duplicates.
    pub fn add_token(&mut self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() || self.allowed_tokens.contains(&symbol) {
            return false;
        }
        self.allowed_tokens.push(symbol);
        true
    }

    pub fn remove_token(&mut self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        let before = self.allowed_tokens.len();
        self.allowed_tokens.retain(|t| *t != symbol);
        self.allowed_tokens.len() != before
    }

    pub fn allows(&self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        self.allowed_tokens.iter().any(|t| *t == symbol)
    }
}

/// Parse a comma separated token list such as `"apt, usdc,USDT"`
pub fn parse_token_list(input: &str) -> Vec<String> {
    normalize_tokens(input.split(','))
}

/// Trim, upper-case and de-duplicate symbols keeping first occurrence order.
/// Blank entries are dropped.
pub fn normalize_tokens<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        let symbol = token.as_ref().trim().to_uppercase();
        if symbol.is_empty() || out.contains(&symbol) {
            continue;
        }
        out.push(symbol);
    }
    out
}

fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= 32
        && symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}
