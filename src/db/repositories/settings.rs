use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::connection::Database;

impl Database {
    /// Store an arbitrary JSON-encoded value under `key`, replacing any
    /// previous value.
    pub async fn put_setting<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let key = key.to_string();
        let encoded = serde_json::to_string(value)
            .with_context(|| format!("failed to encode setting {key}"))?;

        self.execute(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![key, encoded],
            )
            .context("failed to write setting")?;
            Ok(())
        })
        .await
    }

    pub async fn get_setting<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let key = key.to_string();
        self.read(move |conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT value FROM settings WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;

            raw.map(|value| {
                serde_json::from_str(&value)
                    .with_context(|| format!("setting {key} is not valid JSON"))
            })
            .transpose()
        })
        .await
    }
}
