//! Canned trading assistant
//!
//! Keyword-routed static replies. No model, no network.

use mirror_core::{ChatMessage, MessageKind};

pub const GREETING: &str = "Hi, I'm the trading assistant. Ask me about:\n\
    - stock prices\n\
    - crypto markets\n\
    - trading strategies\n\
    - your portfolio";

const STOCK_REPLY: &str = "Stock snapshot:\n\
    AAPL  $175.43  +2.1%\n\
    GOOGL $2847.63 +1.8%\n\
    MSFT  $378.85  +1.2%\n\
    TSLA  $248.50  -0.8%";

const CRYPTO_REPLY: &str = "Crypto snapshot:\n\
    BTC  $43250  +3.2%\n\
    ETH  $2650   +2.8%\n\
    SOL  $98.75  +5.1%\n\
    APT  $8.45   +1.5%\n\
    Total market cap $1.68T, 24h volume $89.5B";

const STRATEGY_REPLY: &str = "Common approaches:\n\
    - day trading for intraday moves\n\
    - swing trading for multi-day trends\n\
    - position trading for long holds\n\
    Keep risk per trade small and always set a stop loss.";

const PORTFOLIO_REPLY: &str = "Portfolio snapshot:\n\
    BTC   0.5   $21625\n\
    ETH   2.3   $6095\n\
    APT   150   $1267\n\
    USDC        $5000\n\
    Total $33987 (+1.5% in 24h)";

const HELP_REPLY: &str = "I can talk about stock prices, crypto data, trading \
    strategies and portfolios. Try \"bitcoin price\" or \"best strategy\".";

/// Route `input` to a canned reply
pub fn respond(input: &str) -> ChatMessage {
    let text = input.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

    let (reply, kind) = if has(&["stock", "price"]) {
        (STOCK_REPLY, MessageKind::Stock)
    } else if has(&["crypto", "bitcoin"]) {
        (CRYPTO_REPLY, MessageKind::Crypto)
    } else if has(&["trade", "strategy"]) {
        (STRATEGY_REPLY, MessageKind::Trade)
    } else if has(&["portfolio", "balance"]) {
        (PORTFOLIO_REPLY, MessageKind::Trade)
    } else {
        (HELP_REPLY, MessageKind::Text)
    };

    ChatMessage::bot(reply, kind)
}

/// Conversation transcript, oldest first
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::bot(GREETING, MessageKind::Text)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append the user's message and the reply. Blank input is ignored.
    pub fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        if input.trim().is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::user(input));
        self.messages.push(respond(input));
        self.messages.last()
    }
}
