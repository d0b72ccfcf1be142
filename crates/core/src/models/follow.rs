//! Follow state of the connected account

use super::RuleSet;
use crate::types::LeaderAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the connected account currently mirrors a leader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FollowingState {
    #[default]
    NotFollowing,
    Following,
}

impl FollowingState {
    pub fn is_following(&self) -> bool {
        matches!(self, FollowingState::Following)
    }
}

impl fmt::Display for FollowingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowingState::NotFollowing => f.write_str("Not Following"),
            FollowingState::Following => f.write_str("Following"),
        }
    }
}

/// Point-in-time view of a follow controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowSnapshot {
    pub state: FollowingState,
    /// Set only while following
    pub leader: Option<LeaderAddress>,
    /// Rules last confirmed on chain, or the defaults before any follow
    pub rules: RuleSet,
    pub pending: bool,
}

impl Default for FollowSnapshot {
    fn default() -> Self {
        Self {
            state: FollowingState::NotFollowing,
            leader: None,
            rules: RuleSet::default(),
            pending: false,
        }
    }
}
