//! Column mapping and row standardization.
//!
//! Every canonical field is matched independently against the uploaded
//! headers; the earliest header with the highest score wins if it reaches
//! the match threshold. The same header may serve several fields.

use serde_json::Value;

use crate::models::{ColumnMapping, FieldMapping, RawRecord, StandardizedRecord};
use crate::schema::CanonicalSchema;
use crate::similarity;

/// Minimum score (inclusive) for a header to be mapped onto a field.
pub const MATCH_THRESHOLD: f64 = 0.5;

/// Build a mapping with the default [`MATCH_THRESHOLD`].
pub fn build_mapping<S: AsRef<str>>(schema: &CanonicalSchema, headers: &[S]) -> ColumnMapping {
    build_mapping_with_threshold(schema, headers, MATCH_THRESHOLD)
}

pub fn build_mapping_with_threshold<S: AsRef<str>>(
    schema: &CanonicalSchema,
    headers: &[S],
    threshold: f64,
) -> ColumnMapping {
    let entries = schema
        .fields
        .iter()
        .map(|field| match best_header(field, headers) {
            Some((header, score)) if score >= threshold => FieldMapping {
                field: field.clone(),
                source: Some(header.to_string()),
                score,
            },
            Some((_, score)) => FieldMapping {
                field: field.clone(),
                source: None,
                score,
            },
            None => FieldMapping {
                field: field.clone(),
                source: None,
                score: 0.0,
            },
        })
        .collect();

    ColumnMapping::new(entries)
}

fn best_header<'h, S: AsRef<str>>(field: &str, headers: &'h [S]) -> Option<(&'h str, f64)> {
    let mut best: Option<(&'h str, f64)> = None;
    for header in headers {
        let header = header.as_ref();
        let score = similarity::score(header, field);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((header, score));
        }
    }
    best
}

/// Rewrite one raw record into the schema's canonical shape.
pub fn standardize(
    schema: &CanonicalSchema,
    mapping: &ColumnMapping,
    record: &RawRecord,
) -> StandardizedRecord {
    schema
        .fields
        .iter()
        .map(|field| {
            let value = mapping
                .source_for(field)
                .and_then(|source| record.get(source))
                .cloned()
                .unwrap_or(Value::Null);
            (field.clone(), value)
        })
        .collect()
}
