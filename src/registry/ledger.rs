// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::RegistryError;

/// Append-only record of installed processes, persisted across restarts.
#[derive(Debug, Clone)]
pub struct InstallLedger {
    pool: SqlitePool,
}

impl InstallLedger {
    pub async fn open(pool: SqlitePool) -> Result<Self, RegistryError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS installed_processes (\
             process_uid TEXT PRIMARY KEY, \
             installed_at TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Record `uid` as installed. A second insert is `AlreadyInstalled`.
    pub async fn insert(&self, uid: &str) -> Result<(), RegistryError> {
        let result = sqlx::query(
            "INSERT INTO installed_processes (process_uid, installed_at) VALUES (?, ?)",
        )
        .bind(uid)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RegistryError::AlreadyInstalled {
                    uid: uid.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn contains(&self, uid: &str) -> Result<bool, RegistryError> {
        let row = sqlx::query("SELECT 1 FROM installed_processes WHERE process_uid = ?")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Installed uids, oldest first.
    pub async fn installed_uids(&self) -> Result<Vec<String>, RegistryError> {
        let rows = sqlx::query("SELECT process_uid FROM installed_processes ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("process_uid").map_err(RegistryError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::database::connect_in_memory;

    #[tokio::test]
    async fn test_insert_is_strict() {
        let ledger = InstallLedger::open(connect_in_memory().await.unwrap())
            .await
            .unwrap();

        assert!(!ledger.contains("tagger").await.unwrap());
        ledger.insert("tagger").await.unwrap();
        assert!(ledger.contains("tagger").await.unwrap());

        let again = ledger.insert("tagger").await;
        assert!(matches!(again, Err(RegistryError::AlreadyInstalled { uid }) if uid == "tagger"));
    }

    #[tokio::test]
    async fn test_installed_uids_in_install_order_and_survive_reopen() {
        let pool = connect_in_memory().await.unwrap();
        let ledger = InstallLedger::open(pool.clone()).await.unwrap();
        ledger.insert("b").await.unwrap();
        ledger.insert("a").await.unwrap();

        let reopened = InstallLedger::open(pool).await.unwrap();
        assert_eq!(reopened.installed_uids().await.unwrap(), vec!["b", "a"]);
    }
}
