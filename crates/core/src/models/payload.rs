//! Contract call payloads handed to the wallet for signing

use crate::types::ContractConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry functions exposed by the mirror trading module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractFunction {
    FollowLeader,
    UnfollowLeader,
    UpdateRules,
}

impl ContractFunction {
    pub fn name(&self) -> &'static str {
        match self {
            ContractFunction::FollowLeader => "follow_leader",
            ContractFunction::UnfollowLeader => "unfollow_leader",
            ContractFunction::UpdateRules => "update_rules",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "follow_leader" => Some(ContractFunction::FollowLeader),
            "unfollow_leader" => Some(ContractFunction::UnfollowLeader),
            "update_rules" => Some(ContractFunction::UpdateRules),
            _ => None,
        }
    }
}

impl fmt::Display for ContractFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single positional argument.
///
/// Serialized the way the wallet adapter expects JSON arguments:
/// u64 values travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallArg {
    Bool(bool),
    #[serde(with = "u64_string")]
    U64(u64),
    Number(f64),
    Text(String),
    TextList(Vec<String>),
}

mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u64>().map_err(serde::de::Error::custom)
    }
}

/// Entry function payload in wallet-adapter shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFunctionPayload {
    /// `address::module::function`
    pub function: String,
    pub type_arguments: Vec<String>,
    pub function_arguments: Vec<CallArg>,
}

impl EntryFunctionPayload {
    pub fn new(contract: &ContractConfig, function: ContractFunction, args: Vec<CallArg>) -> Self {
        Self {
            function: contract.function_id(function.name()),
            type_arguments: Vec::new(),
            function_arguments: args,
        }
    }

    /// The trailing function name, if it is one of ours
    pub fn contract_function(&self) -> Option<ContractFunction> {
        self.function
            .rsplit("::")
            .next()
            .and_then(ContractFunction::from_name)
    }
}
