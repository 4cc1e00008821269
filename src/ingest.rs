//! Ingestion pipeline wiring and the file-based CLI commands.
//!
//! Builds a [`Pipeline`] from configuration and a database pool, and
//! implements `mingest ingest <file>` and `mingest detect <file>`.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

use marine_ingest_core::models::ColumnMapping;
use marine_ingest_core::pipeline::Pipeline;
use marine_ingest_core::{detect, mapping, reader};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Pipeline writing to SQLite through `pool`.
pub fn build_pipeline(config: &Config, pool: SqlitePool) -> Pipeline {
    Pipeline::new(
        Arc::new(config.registry()),
        config.thresholds(),
        Arc::new(SqliteStore::new(pool)),
    )
}

fn read_upload(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((bytes, filename))
}

pub async fn run_ingest(config: &Config, path: &Path) -> Result<()> {
    let (bytes, filename) = read_upload(path)?;

    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool, &config.registry()).await?;

    let pipeline = build_pipeline(config, pool.clone());
    let result = pipeline.ingest(&bytes, &filename).await;
    pool.close().await;
    let report = result?;

    println!("ingest {}", path.display());
    println!("  upload id: {}", report.upload_id);
    println!(
        "  detected table: {} (confidence {:.2})",
        report.detected_table, report.confidence
    );
    println!("  rows written: {}", report.rows_processed);
    print_mapping(&report.columns_mapped);
    println!("ok");
    Ok(())
}

/// Dry run: parse, detect, and map without opening the database.
pub fn run_detect(config: &Config, path: &Path) -> Result<()> {
    let (bytes, filename) = read_upload(path)?;
    let registry = config.registry();
    let thresholds = config.thresholds();

    let parsed = reader::parse(&bytes, &filename)?;
    println!("detect {} (dry-run)", path.display());
    println!("  headers: {}", parsed.headers.join(", "));
    println!("  rows: {}", parsed.records.len());
    println!("  candidates:");
    for (schema, score) in detect::rank(&registry, &parsed.headers) {
        println!("    {:<24} {:.3}", schema.table_name, score);
    }

    let detection =
        detect::detect_with_floor(&registry, &parsed.headers, thresholds.confidence_floor)?;
    let mapping = mapping::build_mapping_with_threshold(
        detection.schema,
        &parsed.headers,
        thresholds.match_threshold,
    );
    println!(
        "  detected table: {} (confidence {:.2})",
        detection.schema.table_name, detection.confidence
    );
    print_mapping(&mapping);
    Ok(())
}

fn print_mapping(mapping: &ColumnMapping) {
    println!("  columns mapped: {}/{}", mapping.matched_count(), mapping.entries().len());
    for entry in mapping.entries() {
        match &entry.source {
            Some(source) => println!("    {} <- {} ({:.2})", entry.field, source, entry.score),
            None => println!("    {} <- (unmatched)", entry.field),
        }
    }
}
