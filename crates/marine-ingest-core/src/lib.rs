//! # marine-ingest core
//!
//! Storage-agnostic logic for turning arbitrary tabular exports into
//! canonical records: header similarity scoring, schema detection, column
//! mapping, CSV/JSON parsing, and the atomic batch writer.
//!
//! This crate contains no tokio, sqlx, or HTTP dependencies. Persistence
//! goes through the [`store::BatchStore`] trait, which the application
//! crate implements on top of SQLite.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──▶ reader ──▶ detect ──▶ mapping ──▶ writer ──▶ BatchStore
//!          (parse)    (schema)   (columns)   (batch)
//! ```

pub mod detect;
pub mod error;
pub mod mapping;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod schema;
pub mod similarity;
pub mod store;
pub mod writer;

pub use error::{IngestError, Result};
