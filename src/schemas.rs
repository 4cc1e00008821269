//! `mingest schemas`: print the active canonical schema registry.

use anyhow::Result;

use crate::config::Config;

pub fn list_schemas(config: &Config) -> Result<()> {
    let registry = config.registry();
    let source = if config.schemas.is_empty() {
        "built-in"
    } else {
        "config"
    };

    println!("{} schemas ({})", registry.len(), source);
    for (i, schema) in registry.iter().enumerate() {
        println!("  {}. {}", i + 1, schema.table_name);
        println!("     fields: {}", schema.fields.join(", "));
    }
    println!(
        "confidence floor: {:.2}, match threshold: {:.2}",
        config.detection.confidence_floor, config.detection.match_threshold
    );
    Ok(())
}
