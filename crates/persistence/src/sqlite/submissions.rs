//! Journal of contract submissions made from this machine

use mirror_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Lifecycle of a journaled submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Handed to the wallet, no hash yet
    Pending,
    /// Wallet returned a hash, awaiting confirmation
    Submitted,
    Confirmed,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Confirmed => "confirmed",
            SubmissionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "submitted" => Some(SubmissionStatus::Submitted),
            "confirmed" => Some(SubmissionStatus::Confirmed),
            "failed" => Some(SubmissionStatus::Failed),
            _ => None,
        }
    }
}

/// Submission record stored in database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub account: String,
    pub function: String,
    pub leader: Option<String>,
    pub payload: String,
    pub tx_hash: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub created_at: Option<String>,
    pub finished_at: Option<String>,
}

impl SubmissionRow {
    pub fn status(&self) -> Option<SubmissionStatus> {
        SubmissionStatus::parse(&self.status)
    }
}

/// Record a submission about to be handed to the wallet
pub async fn begin_submission(
    pool: &SqlitePool,
    account: &str,
    function: &str,
    leader: Option<&str>,
    payload_json: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO submissions (account, function, leader, payload, status)
        VALUES (?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(account)
    .bind(function)
    .bind(leader)
    .bind(payload_json)
    .execute(pool)
    .await
    .map_err(|e| Error::Database(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

pub async fn mark_submitted(pool: &SqlitePool, id: i64, tx_hash: &str) -> Result<()> {
    sqlx::query("UPDATE submissions SET tx_hash = ?, status = 'submitted' WHERE id = ?")
        .bind(tx_hash)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}

pub async fn mark_confirmed(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query(
        "UPDATE submissions SET status = 'confirmed', finished_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}

pub async fn mark_failed(pool: &SqlitePool, id: i64, error: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE submissions
        SET status = 'failed', error = ?, finished_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(error)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}

/// Most recent submissions first, optionally for one account
pub async fn recent_submissions(
    pool: &SqlitePool,
    account: Option<&str>,
    limit: u32,
) -> Result<Vec<SubmissionRow>> {
    let mut query = String::from(
        r#"
        SELECT id, account, function, leader, payload, tx_hash, status, error,
               CAST(created_at AS TEXT) AS created_at, CAST(finished_at AS TEXT) AS finished_at
        FROM submissions
        "#,
    );

    if account.is_some() {
        query.push_str(" WHERE account = ?");
    }
    query.push_str(" ORDER BY id DESC LIMIT ?");

    let mut builder = sqlx::query_as::<_, SubmissionRow>(&query);
    if let Some(acct) = account {
        builder = builder.bind(acct);
    }

    let rows = builder
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

    Ok(rows)
}
