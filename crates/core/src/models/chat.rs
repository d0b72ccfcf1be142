//! Assistant chat messages

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Topic a message belongs to, used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Stock,
    Crypto,
    Trade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: uuid::Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub kind: MessageKind,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User, MessageKind::Text)
    }

    pub fn bot(text: impl Into<String>, kind: MessageKind) -> Self {
        Self::new(text, Sender::Bot, kind)
    }

    fn new(text: impl Into<String>, sender: Sender, kind: MessageKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp: chrono::Utc::now(),
            kind,
        }
    }
}
