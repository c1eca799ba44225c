//! Settings table accessors
//!
//! Key/value rows; today the only key is the spreadsheet id.

use ermihadu_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Key under which the spreadsheet id is persisted
pub const SHEET_ID_KEY: &str = "ermihadu_sheet_id";

/// Stored spreadsheet id, if one was ever saved
pub async fn get_sheet_id(db: &Pool<Sqlite>) -> Result<Option<String>> {
    Ok(get_setting(db, SHEET_ID_KEY)
        .await?
        .filter(|id| !id.trim().is_empty()))
}

pub async fn set_sheet_id(db: &Pool<Sqlite>, id: &str) -> Result<()> {
    set_setting(db, SHEET_ID_KEY, id).await
}

async fn get_setting(db: &Pool<Sqlite>, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    Ok(row.map(|(value,)| value))
}

async fn set_setting(db: &Pool<Sqlite>, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
