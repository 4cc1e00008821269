//! Schema migrations.
//!
//! Every registered canonical schema gets its own table holding one JSON
//! document per standardized row:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS <table_name> (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     upload_id TEXT NOT NULL,
//!     data TEXT NOT NULL,
//!     created_at INTEGER NOT NULL
//! )
//! ```
//!
//! Migrations are idempotent.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use marine_ingest_core::schema::SchemaRegistry;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool, &config.registry()).await?;
    pool.close().await;
    Ok(())
}

/// Create the per-schema tables on an existing pool.
pub async fn migrate_pool(pool: &SqlitePool, registry: &SchemaRegistry) -> Result<()> {
    for schema in registry {
        let table = &schema.table_name;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                upload_id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#
        ))
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create table {}", table))?;

        sqlx::query(&format!(
            r#"CREATE INDEX IF NOT EXISTS "idx_{table}_upload_id" ON "{table}"(upload_id)"#
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}
