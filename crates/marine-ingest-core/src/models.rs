//! Data types that flow through the ingestion pipeline.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One input row keyed by the header it appeared under.
///
/// CSV values are always strings; JSON values keep their native type.
pub type RawRecord = Map<String, Value>;

/// One output row holding exactly the canonical schema's fields, in schema
/// order. Unmapped or missing values are an explicit `null`.
pub type StandardizedRecord = Map<String, Value>;

/// Result of parsing an uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub records: Vec<RawRecord>,
    /// Header names in file order.
    pub headers: Vec<String>,
}

/// Mapping decision for a single canonical field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMapping {
    pub field: String,
    /// Chosen source header, or `None` when nothing scored high enough.
    pub source: Option<String>,
    /// Best score seen for this field, even when unmatched.
    pub score: f64,
}

/// Canonical field → source header mapping, one entry per field in schema
/// order.
///
/// Serializes as a JSON object with unmatched fields rendered as `""`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnMapping {
    entries: Vec<FieldMapping>,
}

impl ColumnMapping {
    pub fn new(entries: Vec<FieldMapping>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    /// Source header for `field`, if it was matched.
    pub fn source_for(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .and_then(|e| e.source.as_deref())
    }

    pub fn matched_count(&self) -> usize {
        self.entries.iter().filter(|e| e.source.is_some()).count()
    }

    pub fn unmatched_fields(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.source.is_none())
            .map(|e| e.field.as_str())
    }
}

impl Serialize for ColumnMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.field, entry.source.as_deref().unwrap_or(""))?;
        }
        map.end()
    }
}

/// Rows from one upload, committed together under one identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadBatch {
    pub upload_id: Uuid,
    pub table_name: String,
    pub records: Vec<StandardizedRecord>,
}

impl UploadBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
