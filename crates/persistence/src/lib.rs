//! Mirror Persistence - Settings store, submission journal and market cache

pub mod cache;
pub mod sqlite;

pub use cache::MarketCache;
pub use sqlite::Database;
