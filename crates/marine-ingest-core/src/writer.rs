//! Batch writer: standardize rows and commit them as one upload.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::mapping::standardize;
use crate::models::{ColumnMapping, RawRecord, UploadBatch};
use crate::pipeline::UploadStage;
use crate::schema::CanonicalSchema;
use crate::store::BatchStore;

/// Writes standardized uploads through an injected [`BatchStore`].
#[derive(Clone)]
pub struct IngestionWriter {
    store: Arc<dyn BatchStore>,
}

impl IngestionWriter {
    pub fn new(store: Arc<dyn BatchStore>) -> Self {
        Self { store }
    }

    /// Standardize `records` against `schema` and commit them atomically.
    ///
    /// A fresh random `upload_id` tags every row. A row whose document
    /// cannot be serialized is dropped and logged; the remaining rows are
    /// committed in a single transaction or not at all.
    ///
    /// # Errors
    ///
    /// [`IngestError::Persistence`] when the store rejects the batch.
    pub async fn write(
        &self,
        schema: &CanonicalSchema,
        mapping: &ColumnMapping,
        records: &[RawRecord],
    ) -> Result<UploadBatch> {
        let upload_id = Uuid::new_v4();

        let mut standardized = Vec::with_capacity(records.len());
        let mut documents = Vec::with_capacity(records.len());
        for (row, record) in records.iter().enumerate() {
            let clean = standardize(schema, mapping, record);
            match serde_json::to_string(&clean) {
                Ok(doc) => {
                    documents.push(doc);
                    standardized.push(clean);
                }
                Err(e) => warn!(row, error = %e, "dropping row that failed to serialize"),
            }
        }

        debug!(
            %upload_id,
            table = %schema.table_name,
            rows = documents.len(),
            stage = %UploadStage::Standardized,
            "committing batch"
        );

        self.store
            .insert_batch(&schema.table_name, upload_id, &documents)
            .await
            .map_err(|e| IngestError::Persistence(format!("{:#}", e)))?;

        Ok(UploadBatch {
            upload_id,
            table_name: schema.table_name.clone(),
            records: standardized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::build_mapping;
    use crate::reader;
    use crate::store::memory::InMemoryStore;
    use serde_json::Value;

    const CSV: &[u8] = b"sciName,VERN_NAME\n\
        Thunnus albacares,Yellowfin tuna\n\
        Sardinella longiceps,Indian oil sardine\n\
        Rastrelliger kanagurta,Indian mackerel\n";

    fn schema() -> CanonicalSchema {
        CanonicalSchema::new("species_data", ["scientific_name", "vernacularname"])
    }

    #[tokio::test]
    async fn test_writes_three_rows_with_one_upload_id() {
        let store = Arc::new(InMemoryStore::new());
        let writer = IngestionWriter::new(store.clone());
        let parsed = reader::parse(CSV, "species.csv").unwrap();
        let schema = schema();
        let mapping = build_mapping(&schema, &parsed.headers);

        let batch = writer.write(&schema, &mapping, &parsed.records).await.unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.table_name, "species_data");
        for record in &batch.records {
            assert_eq!(record.len(), 2);
            assert!(record["scientific_name"].is_string());
            assert!(record["vernacularname"].is_string());
        }
        assert_eq!(batch.records[1]["vernacularname"], "Indian oil sardine");

        let rows = store.rows("species_data");
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.upload_id == batch.upload_id));
        let first: Value = serde_json::from_str(&rows[0].data).unwrap();
        assert_eq!(first["scientific_name"], "Thunnus albacares");
    }

    #[tokio::test]
    async fn test_upload_ids_are_unique() {
        let store = Arc::new(InMemoryStore::new());
        let writer = IngestionWriter::new(store.clone());
        let parsed = reader::parse(CSV, "species.csv").unwrap();
        let schema = schema();
        let mapping = build_mapping(&schema, &parsed.headers);

        let a = writer.write(&schema, &mapping, &parsed.records).await.unwrap();
        let b = writer.write(&schema, &mapping, &parsed.records).await.unwrap();
        assert_ne!(a.upload_id, b.upload_id);
        assert_eq!(store.count_rows("species_data", Some(a.upload_id)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_persistence_error() {
        let store = Arc::new(InMemoryStore::failing_after(1));
        let writer = IngestionWriter::new(store.clone());
        let parsed = reader::parse(CSV, "species.csv").unwrap();
        let schema = schema();
        let mapping = build_mapping(&schema, &parsed.headers);

        let err = writer
            .write(&schema, &mapping, &parsed.records)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Persistence(ref m) if m.contains("injected")));
        assert_eq!(store.count_rows("species_data", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_heterogeneous_json_standardizes_missing_to_null() {
        let store = Arc::new(InMemoryStore::new());
        let writer = IngestionWriter::new(store);
        let parsed = reader::parse(br#"[{"a": 1, "b": 2}, {"a": 3, "c": 4}]"#, "x.json").unwrap();
        let schema = CanonicalSchema::new("t", ["a", "b", "c"]);
        let mapping = build_mapping(&schema, &parsed.headers);

        let batch = writer.write(&schema, &mapping, &parsed.records).await.unwrap();
        assert_eq!(batch.records[0]["b"], 2);
        assert_eq!(batch.records[1]["a"], 3);
        assert_eq!(batch.records[1]["b"], Value::Null);
        assert_eq!(batch.records[1]["c"], Value::Null);
    }
}
