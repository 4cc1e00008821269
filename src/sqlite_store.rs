//! SQLite-backed [`BatchStore`] implementation.
//!
//! Each batch runs inside one transaction: every document is inserted in
//! turn and the transaction commits only after the last insert succeeds.
//! An error at any point drops the transaction, which rolls it back.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use marine_ingest_core::store::BatchStore;

/// SQLite implementation of the [`BatchStore`] trait.
///
/// Table names come from the validated schema registry and are quoted
/// when interpolated.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored documents for one upload, in insertion order.
    pub async fn documents(&self, table_name: &str, upload_id: Uuid) -> Result<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(&format!(
            r#"SELECT data FROM "{table_name}" WHERE upload_id = ? ORDER BY id"#
        ))
        .bind(upload_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl BatchStore for SqliteStore {
    async fn insert_batch(
        &self,
        table_name: &str,
        upload_id: Uuid,
        documents: &[String],
    ) -> Result<()> {
        let sql = format!(
            r#"INSERT INTO "{table_name}" (upload_id, data, created_at) VALUES (?, ?, ?)"#
        );
        let upload_id = upload_id.to_string();
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;

        for (row, doc) in documents.iter().enumerate() {
            sqlx::query(&sql)
                .bind(&upload_id)
                .bind(doc)
                .bind(now)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("insert of row {} into {} failed", row, table_name))?;
        }

        tx.commit().await.context("commit failed")?;
        Ok(())
    }

    async fn count_rows(&self, table_name: &str, upload_id: Option<Uuid>) -> Result<i64> {
        let count: i64 = match upload_id {
            Some(id) => {
                sqlx::query_scalar(&format!(
                    r#"SELECT COUNT(*) FROM "{table_name}" WHERE upload_id = ?"#
                ))
                .bind(id.to_string())
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(&format!(r#"SELECT COUNT(*) FROM "{table_name}""#))
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }
}
