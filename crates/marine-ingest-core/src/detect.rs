//! Schema detection: pick the registered schema that best explains a header
//! set.
//!
//! Each schema is scored as the mean, over its canonical fields, of the best
//! [`similarity::score`](crate::similarity::score) against any uploaded
//! header. This tolerates renamed, reordered, extra, and missing columns.
//! The highest mean wins; ties keep the earliest registered schema. A winner
//! below the confidence floor is rejected with
//! [`IngestError::UnknownFormat`].

use crate::error::{IngestError, Result};
use crate::schema::{CanonicalSchema, SchemaRegistry};
use crate::similarity;

/// Minimum mean field score for a schema to be accepted.
pub const CONFIDENCE_FLOOR: f64 = 0.40;

/// The accepted schema and how well it matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection<'a> {
    pub schema: &'a CanonicalSchema,
    pub confidence: f64,
}

/// Best score for `field` against any of `headers` (0.0 when there are none).
pub fn best_field_score<S: AsRef<str>>(field: &str, headers: &[S]) -> f64 {
    headers
        .iter()
        .map(|h| similarity::score(h.as_ref(), field))
        .fold(0.0, f64::max)
}

/// Mean of the per-field best scores for one schema.
pub fn schema_score<S: AsRef<str>>(schema: &CanonicalSchema, headers: &[S]) -> f64 {
    if schema.fields.is_empty() {
        return 0.0;
    }
    let total: f64 = schema
        .fields
        .iter()
        .map(|field| best_field_score(field, headers))
        .sum();
    total / schema.fields.len() as f64
}

/// Every schema's score, in registration order.
pub fn rank<'a, S: AsRef<str>>(
    registry: &'a SchemaRegistry,
    headers: &[S],
) -> Vec<(&'a CanonicalSchema, f64)> {
    registry
        .iter()
        .map(|schema| (schema, schema_score(schema, headers)))
        .collect()
}

/// Detect with the default [`CONFIDENCE_FLOOR`].
pub fn detect<'a, S: AsRef<str>>(
    registry: &'a SchemaRegistry,
    headers: &[S],
) -> Result<Detection<'a>> {
    detect_with_floor(registry, headers, CONFIDENCE_FLOOR)
}

pub fn detect_with_floor<'a, S: AsRef<str>>(
    registry: &'a SchemaRegistry,
    headers: &[S],
    confidence_floor: f64,
) -> Result<Detection<'a>> {
    let mut best: Option<Detection<'a>> = None;

    for (schema, confidence) in rank(registry, headers) {
        // Strict comparison keeps the earlier schema on ties.
        if best.map_or(true, |b| confidence > b.confidence) {
            best = Some(Detection { schema, confidence });
        }
    }

    match best {
        Some(detection) if detection.confidence >= confidence_floor => Ok(detection),
        Some(detection) => Err(IngestError::UnknownFormat {
            confidence: detection.confidence,
        }),
        None => Err(IngestError::UnknownFormat { confidence: 0.0 }),
    }
}
