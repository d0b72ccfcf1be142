//! SQLite database management

mod connection;
mod settings;
mod submissions;

pub use connection::Database;
pub use settings::*;
pub use submissions::*;
