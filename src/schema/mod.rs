//! Schema loading
//!
//! The integrity check only needs to know whether the schema behind a tag
//! can be loaded. [`SchemaLoader`] is that boundary; the crate ships the
//! core schemas embedded and can also read a schema tree from disk.
//!
//! # Modules
//!
//! - [`embedded`]: Core schemas compiled into the binary
//! - [`directory`]: Schemas read from a `<authority>/<path>.yaml` tree
//! - [`error`]: Error types for schema loading

pub mod directory;
pub mod embedded;
pub mod error;

#[cfg(test)]
use mockall::automock;

pub use directory::DirectorySchemaLoader;
pub use embedded::EmbeddedSchemas;
pub use error::SchemaError;

/// Source of schema documents, keyed by fully qualified tag
#[cfg_attr(test, automock)]
pub trait SchemaLoader: Send + Sync {
    /// Load and parse the schema for `tag`
    ///
    /// # Returns
    /// * `Ok(Value)` - The schema document, always a mapping
    /// * `Err(SchemaError)` - If the schema is missing, unreadable or declares another tag
    fn load_schema(&self, tag: &str) -> Result<serde_json::Value, SchemaError>;
}

/// Parse schema text and check that it describes `tag`
pub(crate) fn parse_schema(tag: &str, text: &str) -> Result<serde_json::Value, SchemaError> {
    let schema: serde_json::Value =
        serde_yaml::from_str(text).map_err(|source| SchemaError::Yaml {
            tag: tag.to_string(),
            source,
        })?;

    if !schema.is_object() {
        return Err(SchemaError::NotAMapping(tag.to_string()));
    }

    let declared = schema.get("tag").and_then(serde_json::Value::as_str);
    if let Some(declared) = declared.filter(|declared| *declared != tag) {
        return Err(SchemaError::TagMismatch {
            requested: tag.to_string(),
            declared: declared.to_string(),
        });
    }

    Ok(schema)
}
