//! Tabular file parsing (CSV and JSON).
//!
//! The format is chosen from the filename: `.json` (any case) is parsed as
//! a JSON array of objects, everything else as CSV.
//!
//! - **JSON**: headers are the first object's keys in document order. Later
//!   objects may carry a different key set; their values keep their native
//!   JSON types.
//! - **CSV**: the first record is the header row and at least one data row
//!   must follow. A leading byte-order mark is stripped from the first
//!   header. Stray quotes inside unquoted fields are kept literally, but
//!   text trailing a closing quote is appended without the quote
//!   (`"x"y` reads as `xy`). Every value is a JSON string.

use serde_json::Value;

use crate::error::{IngestError, Result};
use crate::models::{ParsedFile, RawRecord};

const BOM: char = '\u{feff}';

/// Input format, resolved from the upload's filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_ascii_lowercase().ends_with(".json") {
            FileFormat::Json
        } else {
            FileFormat::Csv
        }
    }
}

/// Parse an uploaded file into raw records and its header list.
pub fn parse(bytes: &[u8], filename: &str) -> Result<ParsedFile> {
    match FileFormat::from_filename(filename) {
        FileFormat::Json => parse_json(bytes),
        FileFormat::Csv => parse_csv(bytes),
    }
}

pub fn parse_json(bytes: &[u8]) -> Result<ParsedFile> {
    let records: Vec<RawRecord> = serde_json::from_slice(bytes)
        .map_err(|e| IngestError::Parse(format!("invalid json: {}", e)))?;

    let Some(first) = records.first() else {
        return Err(IngestError::Parse("json file is empty".to_string()));
    };
    let headers = first.keys().cloned().collect();

    Ok(ParsedFile { records, headers })
}

pub fn parse_csv(bytes: &[u8]) -> Result<ParsedFile> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes);

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()
        .map_err(|e| IngestError::Parse(format!("invalid csv: {}", e)))?;

    if rows.len() < 2 {
        return Err(IngestError::Parse("csv file too short".to_string()));
    }

    let mut headers: Vec<String> = rows[0].iter().map(str::to_string).collect();
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix(BOM) {
            *first = stripped.to_string();
        }
    }

    let records = rows[1..]
        .iter()
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .map(|(header, value)| (header.clone(), Value::String(value.to_string())))
                .collect::<RawRecord>()
        })
        .collect();

    Ok(ParsedFile { records, headers })
}
