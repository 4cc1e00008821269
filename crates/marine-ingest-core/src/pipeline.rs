//! End-to-end upload pipeline.
//!
//! ```text
//! Received → Parsed → SchemaDetected → Mapped → Standardized → Committed
//!     └──────────┴──────────┴─────────────┴──────────┴──▶ Failed(reason)
//! ```
//!
//! Parsing, detection, and mapping are synchronous in-memory work; only
//! the final commit touches storage. Failed uploads are not retried.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::detect::{self, Detection, CONFIDENCE_FLOOR};
use crate::error::Result;
use crate::mapping::{self, MATCH_THRESHOLD};
use crate::models::{ColumnMapping, ParsedFile};
use crate::reader;
use crate::schema::SchemaRegistry;
use crate::store::BatchStore;
use crate::writer::IngestionWriter;

/// Lifecycle of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Parsed,
    SchemaDetected,
    Mapped,
    Standardized,
    Committed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadStage::Received => "received",
            UploadStage::Parsed => "parsed",
            UploadStage::SchemaDetected => "schema_detected",
            UploadStage::Mapped => "mapped",
            UploadStage::Standardized => "standardized",
            UploadStage::Committed => "committed",
        };
        f.write_str(s)
    }
}

/// Detection and mapping cut-offs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub confidence_floor: f64,
    pub match_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            confidence_floor: CONFIDENCE_FLOOR,
            match_threshold: MATCH_THRESHOLD,
        }
    }
}

/// Outcome of a committed upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub upload_id: Uuid,
    pub detected_table: String,
    pub confidence: f64,
    pub rows_processed: usize,
    pub columns_mapped: ColumnMapping,
}

/// Registry, thresholds, and writer bundled for repeated uploads.
pub struct Pipeline {
    registry: Arc<SchemaRegistry>,
    thresholds: Thresholds,
    writer: IngestionWriter,
}

impl Pipeline {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        thresholds: Thresholds,
        store: Arc<dyn BatchStore>,
    ) -> Self {
        Self {
            registry,
            thresholds,
            writer: IngestionWriter::new(store),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Run the whole pipeline and commit the upload.
    pub async fn ingest(&self, bytes: &[u8], filename: &str) -> Result<UploadReport> {
        match self.run(bytes, filename).await {
            Ok(report) => {
                info!(
                    upload_id = %report.upload_id,
                    table = %report.detected_table,
                    rows = report.rows_processed,
                    stage = %UploadStage::Committed,
                    "upload committed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(filename, stage = %e.reached_stage(), error = %e, "upload failed");
                Err(e)
            }
        }
    }

    async fn run(&self, bytes: &[u8], filename: &str) -> Result<UploadReport> {
        let Analysis {
            parsed,
            detection,
            mapping,
        } = self.analyze(bytes, filename)?;

        let batch = self
            .writer
            .write(detection.schema, &mapping, &parsed.records)
            .await?;

        Ok(UploadReport {
            upload_id: batch.upload_id,
            detected_table: batch.table_name,
            confidence: detection.confidence,
            rows_processed: batch.records.len(),
            columns_mapped: mapping,
        })
    }

    fn analyze(&self, bytes: &[u8], filename: &str) -> Result<Analysis<'_>> {
        debug!(filename, bytes = bytes.len(), stage = %UploadStage::Received);

        let parsed = reader::parse(bytes, filename)?;
        debug!(
            rows = parsed.records.len(),
            headers = parsed.headers.len(),
            stage = %UploadStage::Parsed
        );

        let detection = detect::detect_with_floor(
            &self.registry,
            &parsed.headers,
            self.thresholds.confidence_floor,
        )?;
        debug!(
            table = %detection.schema.table_name,
            confidence = detection.confidence,
            stage = %UploadStage::SchemaDetected
        );

        let mapping = mapping::build_mapping_with_threshold(
            detection.schema,
            &parsed.headers,
            self.thresholds.match_threshold,
        );
        debug!(
            matched = mapping.matched_count(),
            fields = detection.schema.fields.len(),
            stage = %UploadStage::Mapped
        );

        Ok(Analysis {
            parsed,
            detection,
            mapping,
        })
    }
}

struct Analysis<'a> {
    parsed: ParsedFile,
    detection: Detection<'a>,
    mapping: ColumnMapping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::store::memory::InMemoryStore;

    const OCEAN_CSV: &[u8] = b"Event Date,Region,Temperature (C),Salinity_PSU,pH\n\
        2024-01-03,Arabian Sea,27.1,35.2,8.1\n\
        2024-01-04,Bay of Bengal,28.4,33.9,8.0\n";

    fn pipeline(store: Arc<InMemoryStore>) -> Pipeline {
        Pipeline::new(
            Arc::new(SchemaRegistry::builtin()),
            Thresholds::default(),
            store,
        )
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(UploadStage::SchemaDetected.to_string(), "schema_detected");
        assert_eq!(
            IngestError::UnknownFormat { confidence: 0.1 }.reached_stage(),
            UploadStage::Parsed
        );
    }

    #[tokio::test]
    async fn test_ingest_commits() {
        let store = Arc::new(InMemoryStore::new());
        let p = pipeline(store.clone());
        let report = p.ingest(OCEAN_CSV, "ocean.csv").await.unwrap();
        assert_eq!(report.detected_table, "oceanographic_data");
        assert_eq!(report.rows_processed, 2);
        assert_eq!(
            store
                .count_rows("oceanographic_data", Some(report.upload_id))
                .await
                .unwrap(),
            2
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["columns_mapped"]["dissolved_oxygen_mg_l"], "");
        assert_eq!(json["columns_mapped"]["salinity_psu"], "Salinity_PSU");
    }

    #[tokio::test]
    async fn test_ingest_unknown_format() {
        let store = Arc::new(InMemoryStore::new());
        let p = pipeline(store);
        let err = p.ingest(b"foo,bar,baz\n1,2,3\n", "x.csv").await.unwrap_err();
        assert!(matches!(err, IngestError::UnknownFormat { .. }));
    }

    #[tokio::test]
    async fn test_ingest_rolls_back_on_store_failure() {
        let store = Arc::new(InMemoryStore::failing_after(1));
        let p = pipeline(store.clone());
        let err = p.ingest(OCEAN_CSV, "ocean.csv").await.unwrap_err();
        assert!(matches!(err, IngestError::Persistence(_)));
        assert_eq!(err.reached_stage(), UploadStage::Standardized);
        assert_eq!(
            store.count_rows("oceanographic_data", None).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_custom_thresholds_reject() {
        let store = Arc::new(InMemoryStore::new());
        let p = Pipeline::new(
            Arc::new(SchemaRegistry::builtin()),
            Thresholds {
                confidence_floor: 0.99,
                match_threshold: 0.5,
            },
            store.clone(),
        );
        assert!(matches!(
            p.ingest(OCEAN_CSV, "ocean.csv").await,
            Err(IngestError::UnknownFormat { .. })
        ));
        assert_eq!(store.count_rows("oceanographic_data", None).await.unwrap(), 0);
    }
}
