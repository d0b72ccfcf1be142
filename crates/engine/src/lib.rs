//! Mirror Engine - follow-state controller, submission, notifications and market feeds

pub mod assistant;
pub mod controller;
pub mod market;
pub mod notifier;
pub mod submitter;
pub mod wallet;

pub use assistant::{respond, ChatSession};
pub use controller::FollowController;
pub use market::{
    load_statistics, spawn_ticker_poller, HttpTickerSource, TickerHandle, TickerSource,
};
pub use notifier::{BroadcastNotifier, FilteredNotifier, Notifier, TracingNotifier};
pub use submitter::TransactionSubmitter;
pub use wallet::WalletSession;
