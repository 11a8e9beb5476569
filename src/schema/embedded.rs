//! Core schemas compiled into the crate

use std::collections::HashMap;

use tracing::debug;

use crate::schema::{SchemaError, SchemaLoader, parse_schema};

macro_rules! core_schemas {
    ($($file:literal),* $(,)?) => {
        &[$((
            concat!("tag:stsci.edu:asdf/core/", $file),
            include_str!(concat!("../../schemas/stsci.edu/asdf/core/", $file, ".yaml")),
        )),*]
    };
}

const CORE: &[(&str, &str)] = core_schemas![
    "asdf-1.0.0",
    "asdf-1.1.0",
    "column-1.0.0",
    "complex-1.0.0",
    "constant-1.0.0",
    "extension_metadata-1.0.0",
    "externalarray-1.0.0",
    "history_entry-1.0.0",
    "integer-1.0.0",
    "ndarray-1.0.0",
    "software-1.0.0",
    "subclass_metadata-1.0.0",
    "table-1.0.0",
];

/// Schemas held in memory, keyed by tag
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSchemas {
    sources: HashMap<String, String>,
}

impl EmbeddedSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// The schemas of every core tag-version in the built-in version maps
    pub fn core() -> Self {
        let mut schemas = Self::new();
        for (tag, text) in CORE {
            schemas.insert(*tag, *text);
        }
        debug!("Loaded {} embedded core schemas", schemas.len());
        schemas
    }

    pub fn insert(&mut self, tag: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(tag.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SchemaLoader for EmbeddedSchemas {
    fn load_schema(&self, tag: &str) -> Result<serde_json::Value, SchemaError> {
        let text = self
            .sources
            .get(tag)
            .ok_or_else(|| SchemaError::NotFound(tag.to_string()))?;
        parse_schema(tag, text)
    }
}
