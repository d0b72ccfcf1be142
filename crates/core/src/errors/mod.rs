//! Error types and Result alias for the mirror trading shell

use thiserror::Error;

/// Main error type for the mirror trading shell
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("A submission is already in flight")]
    SubmissionPending,

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Transaction rejected by user")]
    UserRejected,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Coarse error class used when reporting a failure to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad local input; never reached the network
    Validation,
    /// The wallet refused or failed to sign
    Signing,
    /// Submitted, but confirmation failed or timed out
    Chain,
    /// A data collaborator was unreachable or returned garbage
    Network,
    /// Local storage failure
    Storage,
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::SubmissionPending | Error::WalletNotConnected => {
                ErrorKind::Validation
            }
            Error::UserRejected | Error::Signing(_) => ErrorKind::Signing,
            Error::Chain(_) => ErrorKind::Chain,
            Error::Network(_) | Error::Api(_) | Error::InvalidData(_) => ErrorKind::Network,
            Error::Database(_) => ErrorKind::Storage,
        }
    }

    /// True when the operation never left the local process
    pub fn is_local(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
