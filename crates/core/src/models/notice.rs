//! Transient user-facing notifications

use crate::errors::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// A `{title, description, severity}` message shown for a short while
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            severity,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn success(description: impl Into<String>) -> Self {
        Self::new("Success", description, Severity::Success)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Info)
    }

    /// Failure notice for an operation, titled by error class
    pub fn failure(action: &str, err: &Error) -> Self {
        let title = match err.kind() {
            ErrorKind::Validation => "Invalid Request",
            ErrorKind::Signing => "Signing Failed",
            ErrorKind::Chain => "Transaction Failed",
            ErrorKind::Network => "Network Error",
            ErrorKind::Storage => "Storage Error",
        };
        Self::new(title, format!("{}: {}", action, err), Severity::Error)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_title_follows_error_class() {
        let notice = Notice::failure("Failed to follow leader", &Error::UserRejected);
        assert_eq!(notice.title, "Signing Failed");
        assert!(notice.is_error());
        assert!(notice.description.starts_with("Failed to follow leader"));

        let notice = Notice::failure("Failed to load markets", &Error::Api("HTTP 429".into()));
        assert_eq!(notice.title, "Network Error");
    }
}
