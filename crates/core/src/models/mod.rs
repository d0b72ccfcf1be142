//! Data models for the mirror trading shell

mod chat;
mod follow;
mod market;
mod notice;
mod payload;
mod preferences;
mod rules;
mod transaction;

pub use chat::*;
pub use follow::*;
pub use market::*;
pub use notice::*;
pub use payload::*;
pub use preferences::*;
pub use rules::*;
pub use transaction::*;
