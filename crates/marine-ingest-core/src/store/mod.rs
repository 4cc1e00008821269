//! Storage abstraction for standardized upload batches.
//!
//! The [`BatchStore`] trait is the only side-effecting dependency of the
//! pipeline. The application crate provides a SQLite implementation; the
//! [`memory::InMemoryStore`] here backs tests.
//!
//! Implementations must be `Send + Sync` to be shared across request tasks.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Transactional sink for `(table_name, upload_id, document)` rows.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_batch`](BatchStore::insert_batch) | Insert every document in one transaction |
/// | [`count_rows`](BatchStore::count_rows) | Count committed rows, optionally for one upload |
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Insert all `documents` into `table_name` tagged with `upload_id`.
    ///
    /// Either every document is committed or none is. On error nothing
    /// from this call may remain visible.
    async fn insert_batch(
        &self,
        table_name: &str,
        upload_id: Uuid,
        documents: &[String],
    ) -> Result<()>;

    /// Number of committed rows in `table_name`, optionally restricted to
    /// one upload.
    async fn count_rows(&self, table_name: &str, upload_id: Option<Uuid>) -> Result<i64>;
}
