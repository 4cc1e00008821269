//! Canonical schemas and the ordered registry they live in.
//!
//! Registration order is significant: when two schemas explain an upload
//! equally well, the one registered first wins.

use serde::{Deserialize, Serialize};

/// Known-good column layout for one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    pub table_name: String,
    pub fields: Vec<String>,
}

impl CanonicalSchema {
    pub fn new<I, S>(table_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Immutable, ordered sequence of [`CanonicalSchema`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    schemas: Vec<CanonicalSchema>,
}

impl SchemaRegistry {
    pub fn new(schemas: Vec<CanonicalSchema>) -> Self {
        Self { schemas }
    }

    /// The four marine record types shipped with the service.
    pub fn builtin() -> Self {
        Self::new(vec![
            CanonicalSchema::new(
                "species_data",
                [
                    "scientific_name",
                    "vernacularname",
                    "genus",
                    "family",
                    "class",
                    "iucn_status",
                    "max_weight_kg",
                ],
            ),
            CanonicalSchema::new(
                "occurrence_data",
                [
                    "occurrence_id",
                    "species_id",
                    "eventdate",
                    "decimallatitude",
                    "decimallongitude",
                    "depth",
                    "region",
                ],
            ),
            CanonicalSchema::new(
                "oceanographic_data",
                [
                    "eventdate",
                    "region",
                    "temperature_c",
                    "salinity_psu",
                    "dissolved_oxygen_mg_l",
                    "ph",
                ],
            ),
            CanonicalSchema::new(
                "otolith_metadata",
                [
                    "species_id",
                    "estimated_age",
                    "ring_count",
                    "area_mm2",
                    "length_mm",
                    "width_mm",
                ],
            ),
        ])
    }

    pub fn schemas(&self) -> &[CanonicalSchema] {
        &self.schemas
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalSchema> {
        self.schemas.iter()
    }

    pub fn find(&self, table_name: &str) -> Option<&CanonicalSchema> {
        self.schemas.iter().find(|s| s.table_name == table_name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a SchemaRegistry {
    type Item = &'a CanonicalSchema;
    type IntoIter = std::slice::Iter<'a, CanonicalSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
