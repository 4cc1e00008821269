//! Error taxonomy for the ingestion pipeline.

use thiserror::Error;

use crate::pipeline::UploadStage;

/// Every way an upload can fail.
///
/// None of these are retried; the caller resubmits the file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file was malformed, empty, or had no data rows.
    #[error("error parsing file: {0}")]
    Parse(String),

    /// No registered schema reached the confidence floor.
    #[error("unknown data format (confidence: {confidence:.2})")]
    UnknownFormat { confidence: f64 },

    /// The batch transaction failed and was rolled back.
    #[error("batch insert failed: {0}")]
    Persistence(String),
}

impl IngestError {
    /// The last stage the upload reached before failing.
    pub fn reached_stage(&self) -> UploadStage {
        match self {
            IngestError::Parse(_) => UploadStage::Received,
            IngestError::UnknownFormat { .. } => UploadStage::Parsed,
            IngestError::Persistence(_) => UploadStage::Standardized,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
