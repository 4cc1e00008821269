//! # Marine Ingest
//!
//! Schema-detecting ingestion for heterogeneous marine research datasets.
//!
//! Uploaded CSV or JSON files arrive with whatever column names the
//! originating lab used. Marine Ingest scores the file's headers against a
//! registry of canonical schemas, maps each canonical field to its closest
//! source column, standardizes every record, and commits the batch
//! atomically into the detected schema's table.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────────┐   ┌──────────┐
//! │ CSV / JSON │──▶│  Pipeline                │──▶│  SQLite  │
//! │  upload    │   │ parse→detect→map→commit  │   │ per-table│
//! └────────────┘   └──────────────────────────┘   └──────────┘
//!                        ▲            ▲
//!                  ┌─────┴────┐ ┌─────┴────┐
//!                  │   CLI    │ │   HTTP   │
//!                  │(mingest) │ │ /upload  │
//!                  └──────────┘ └──────────┘
//! ```
//!
//! The detection and mapping algorithms live in `marine-ingest-core`; this
//! crate supplies configuration, the SQLite store, and the two front ends.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Per-schema table creation |
//! | [`sqlite_store`] | Transactional batch store |
//! | [`ingest`] | Pipeline wiring, `ingest` and `detect` commands |
//! | [`schemas`] | `schemas` command |
//! | [`server`] | HTTP upload server |

pub mod config;
pub mod db;
pub mod ingest;
pub mod migrate;
pub mod schemas;
pub mod server;
pub mod sqlite_store;
