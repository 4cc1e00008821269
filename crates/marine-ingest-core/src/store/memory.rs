//! In-memory [`BatchStore`] implementation for tests.
//!
//! Rows are staged per call and only appended once the whole batch has been
//! accepted, mirroring a transaction commit. [`InMemoryStore::failing_after`]
//! injects a failure partway through a batch.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use super::BatchStore;

/// A committed row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub upload_id: Uuid,
    pub data: String,
}

/// In-memory store for tests.
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Vec<StoredRow>>>,
    fail_after: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            fail_after: None,
        }
    }

    /// A store whose batches fail once `n` rows have been staged.
    pub fn failing_after(n: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            fail_after: Some(n),
        }
    }

    /// Snapshot of committed rows for `table_name`.
    pub fn rows(&self, table_name: &str) -> Vec<StoredRow> {
        self.tables
            .read()
            .map(|t| t.get(table_name).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchStore for InMemoryStore {
    async fn insert_batch(
        &self,
        table_name: &str,
        upload_id: Uuid,
        documents: &[String],
    ) -> Result<()> {
        let mut staged = Vec::with_capacity(documents.len());
        for data in documents {
            if self.fail_after == Some(staged.len()) {
                bail!("injected failure after {} rows", staged.len());
            }
            staged.push(StoredRow {
                upload_id,
                data: data.clone(),
            });
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        tables
            .entry(table_name.to_string())
            .or_default()
            .extend(staged);
        Ok(())
    }

    async fn count_rows(&self, table_name: &str, upload_id: Option<Uuid>) -> Result<i64> {
        let tables = self
            .tables
            .read()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let count = tables
            .get(table_name)
            .map(|rows| {
                rows.iter()
                    .filter(|r| upload_id.map_or(true, |id| r.upload_id == id))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{{\"row\":{}}}", i)).collect()
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = InMemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert_batch("t", a, &docs(3)).await.unwrap();
        store.insert_batch("t", b, &docs(2)).await.unwrap();

        assert_eq!(store.count_rows("t", None).await.unwrap(), 5);
        assert_eq!(store.count_rows("t", Some(a)).await.unwrap(), 3);
        assert_eq!(store.count_rows("other", None).await.unwrap(), 0);
        assert_eq!(store.rows("t")[0].data, "{\"row\":0}");
    }

    #[tokio::test]
    async fn test_failure_leaves_nothing() {
        let store = InMemoryStore::failing_after(2);
        let err = store
            .insert_batch("t", Uuid::new_v4(), &docs(4))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("injected"));
        assert_eq!(store.count_rows("t", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_short_batch_under_failure_point_commits() {
        let store = InMemoryStore::failing_after(5);
        store.insert_batch("t", Uuid::new_v4(), &docs(5)).await.unwrap();
        assert_eq!(store.count_rows("t", None).await.unwrap(), 5);
    }
}
