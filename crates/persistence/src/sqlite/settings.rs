//! Key/value settings stored as JSON

use mirror_core::{Error, NotificationConfig, Result, RuleSet, Theme};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

pub const RULES_DRAFT_KEY: &str = "rules_draft";
pub const THEME_KEY: &str = "theme";
pub const NOTIFICATION_CONFIG_KEY: &str = "notification_config";

/// Read a setting. Values that no longer parse are treated as missing.
pub async fn get_setting<T: DeserializeOwned>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    let json: Option<String> =
        sqlx::query_scalar::<sqlx::Sqlite, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

    Ok(json.and_then(|j| match serde_json::from_str(&j) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unparsable setting '{}': {}", key, e);
            None
        }
    }))
}

pub async fn set_setting<T: Serialize>(pool: &SqlitePool, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;

    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = ?2",
    )
    .bind(key)
    .bind(&json)
    .execute(pool)
    .await
    .map_err(|e| Error::Database(e.to_string()))?;

    Ok(())
}

pub async fn delete_setting(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

/// Rules the user was last editing, or the defaults
pub async fn load_rules_draft(pool: &SqlitePool) -> Result<RuleSet> {
    Ok(get_setting(pool, RULES_DRAFT_KEY).await?.unwrap_or_default())
}

pub async fn save_rules_draft(pool: &SqlitePool, rules: &RuleSet) -> Result<()> {
    set_setting(pool, RULES_DRAFT_KEY, rules).await
}

pub async fn load_theme(pool: &SqlitePool) -> Result<Theme> {
    Ok(get_setting(pool, THEME_KEY).await?.unwrap_or_default())
}

pub async fn save_theme(pool: &SqlitePool, theme: Theme) -> Result<()> {
    set_setting(pool, THEME_KEY, &theme).await
}

pub async fn load_notification_config(pool: &SqlitePool) -> Result<NotificationConfig> {
    Ok(get_setting(pool, NOTIFICATION_CONFIG_KEY)
        .await?
        .unwrap_or_default())
}

pub async fn save_notification_config(pool: &SqlitePool, config: &NotificationConfig) -> Result<()> {
    set_setting(pool, NOTIFICATION_CONFIG_KEY, config).await
}
