//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/mingest.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! max_upload_bytes = 10485760
//!
//! [detection]
//! confidence_floor = 0.40
//! match_threshold = 0.5
//!
//! [[schemas]]
//! table_name = "species_data"
//! fields = ["scientific_name", "vernacularname", "class"]
//! ```
//!
//! Only `[db]` is required. Without any `[[schemas]]` entries the built-in
//! marine registry is used.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use marine_ingest_core::pipeline::Thresholds;
use marine_ingest_core::schema::{CanonicalSchema, SchemaRegistry};
use marine_ingest_core::similarity::normalize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_max_upload_bytes() -> usize {
    10 << 20
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_floor: default_confidence_floor(),
            match_threshold: default_match_threshold(),
        }
    }
}

fn default_confidence_floor() -> f64 {
    Thresholds::default().confidence_floor
}
fn default_match_threshold() -> f64 {
    Thresholds::default().match_threshold
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchemaConfig {
    pub table_name: String,
    pub fields: Vec<String>,
}

impl Config {
    /// A config with defaults everywhere except the database path.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            server: ServerConfig::default(),
            detection: DetectionConfig::default(),
            schemas: Vec::new(),
        }
    }

    /// The active registry, in configured order.
    pub fn registry(&self) -> SchemaRegistry {
        if self.schemas.is_empty() {
            return SchemaRegistry::builtin();
        }
        SchemaRegistry::new(
            self.schemas
                .iter()
                .map(|s| CanonicalSchema::new(s.table_name.clone(), s.fields.clone()))
                .collect(),
        )
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            confidence_floor: self.detection.confidence_floor,
            match_threshold: self.detection.match_threshold,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }

    if !(0.0..=1.0).contains(&config.detection.confidence_floor) {
        anyhow::bail!("detection.confidence_floor must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&config.detection.match_threshold) {
        anyhow::bail!("detection.match_threshold must be in [0.0, 1.0]");
    }

    let mut seen = HashSet::new();
    for schema in &config.schemas {
        if !is_sql_identifier(&schema.table_name) {
            anyhow::bail!(
                "schemas.table_name '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                schema.table_name
            );
        }
        if !seen.insert(schema.table_name.to_ascii_lowercase()) {
            anyhow::bail!("schemas.table_name '{}' is defined twice", schema.table_name);
        }
        if schema.fields.is_empty() {
            anyhow::bail!("schema '{}' must list at least one field", schema.table_name);
        }
        if let Some(field) = schema.fields.iter().find(|f| normalize(f).is_empty()) {
            anyhow::bail!(
                "schema '{}' has a field with no name characters: '{}'",
                schema.table_name,
                field
            );
        }
    }

    Ok(())
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config = parse("[db]\npath = \"./data/x.sqlite\"\n").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.thresholds(), Thresholds::default());
        assert_eq!(config.registry(), SchemaRegistry::builtin());
    }

    #[test]
    fn test_custom_schemas_keep_order() {
        let config = parse(
            r#"
[db]
path = "x.sqlite"

[[schemas]]
table_name = "plankton_counts"
fields = ["taxon", "count"]

[[schemas]]
table_name = "species_data"
fields = ["scientific_name"]
"#,
        )
        .unwrap();
        let registry = config.registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.schemas()[0].table_name, "plankton_counts");
    }

    #[test]
    fn test_rejects_bad_table_name() {
        let err = parse(
            r#"
[db]
path = "x.sqlite"

[[schemas]]
table_name = "species; DROP TABLE x"
fields = ["a"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("table_name"));
    }

    #[test]
    fn test_rejects_duplicate_and_empty() {
        assert!(parse(
            r#"
[db]
path = "x.sqlite"

[[schemas]]
table_name = "a"
fields = ["x"]

[[schemas]]
table_name = "a"
fields = ["y"]
"#
        )
        .is_err());

        assert!(parse(
            r#"
[db]
path = "x.sqlite"

[[schemas]]
table_name = "a"
fields = []
"#
        )
        .is_err());

        assert!(parse(
            r#"
[db]
path = "x.sqlite"

[[schemas]]
table_name = "a"
fields = ["__"]
"#
        )
        .is_err());
    }

    #[test]
    fn test_rejects_duplicate_differing_only_in_case() {
        let err = parse(
            r#"
[db]
path = "x.sqlite"

[[schemas]]
table_name = "Species"
fields = ["x"]

[[schemas]]
table_name = "species"
fields = ["y"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }

    #[test]
    fn test_rejects_out_of_range_thresholds() {
        assert!(parse("[db]\npath = \"x\"\n[detection]\nconfidence_floor = 1.5\n").is_err());
        assert!(parse("[db]\npath = \"x\"\n[detection]\nmatch_threshold = -0.1\n").is_err());
        assert!(parse("[db]\npath = \"x\"\n[server]\nmax_upload_bytes = 0\n").is_err());
    }

    #[test]
    fn test_sql_identifier() {
        assert!(is_sql_identifier("species_data"));
        assert!(is_sql_identifier("_t2"));
        assert!(!is_sql_identifier("2t"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("a-b"));
        assert!(!is_sql_identifier("a\"b"));
    }
}
