//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).

use crate::error::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

const VOLUME_KEY: &str = "volume_level";

/// Volume used when nothing has been stored yet
pub const DEFAULT_VOLUME: f32 = 0.75;

/// Get the persisted volume preference (0.0-1.0)
pub async fn get_volume(db: &Pool<Sqlite>) -> Result<f32> {
    match get_setting::<f32>(db, VOLUME_KEY).await? {
        Some(vol) if vol.is_finite() => Ok(vol.clamp(0.0, 1.0)),
        _ => Ok(DEFAULT_VOLUME),
    }
}

/// Persist the volume preference (0.0-1.0)
pub async fn set_volume(db: &Pool<Sqlite>, volume: f32) -> Result<()> {
    let clamped = volume.clamp(0.0, 1.0);
    set_setting(db, VOLUME_KEY, clamped).await
}

/// Generic setting getter
///
/// Returns None if key doesn't exist in database.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Internal(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (insert or update)
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_volume_get_set() {
        let db = init_memory_database().await.unwrap();

        assert_eq!(get_volume(&db).await.unwrap(), DEFAULT_VOLUME);

        set_volume(&db, 0.6).await.unwrap();
        assert_eq!(get_volume(&db).await.unwrap(), 0.6);

        set_volume(&db, 1.5).await.unwrap();
        assert_eq!(get_volume(&db).await.unwrap(), 1.0);

        set_volume(&db, -0.5).await.unwrap();
        assert_eq!(get_volume(&db).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_out_of_range_stored_value_is_clamped() {
        let db = init_memory_database().await.unwrap();
        set_setting(&db, VOLUME_KEY, "7.5").await.unwrap();
        assert_eq!(get_volume(&db).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_generic_setting_update() {
        let db = init_memory_database().await.unwrap();
        assert_eq!(get_setting::<u32>(&db, "missing").await.unwrap(), None);

        set_setting(&db, "answer", 41).await.unwrap();
        set_setting(&db, "answer", 42).await.unwrap();
        assert_eq!(get_setting::<u32>(&db, "answer").await.unwrap(), Some(42));

        set_setting(&db, "answer", "forty-two").await.unwrap();
        assert!(get_setting::<u32>(&db, "answer").await.is_err());
    }
}
