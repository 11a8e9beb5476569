//! Schemas read from a directory tree

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::schema::{SchemaError, SchemaLoader, parse_schema};

/// Loads `tag:<authority>:<path>` from `<root>/<authority>/<path>.yaml`
///
/// `tag:stsci.edu:asdf/core/ndarray-1.0.0` is read from
/// `<root>/stsci.edu/asdf/core/ndarray-1.0.0.yaml`.
#[derive(Debug, Clone)]
pub struct DirectorySchemaLoader {
    root: PathBuf,
}

impl DirectorySchemaLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the schema for `tag`, or `None` if the tag cannot map
    /// to a path inside the root
    pub fn schema_path(&self, tag: &str) -> Option<PathBuf> {
        let (authority, path) = tag.strip_prefix("tag:")?.split_once(':')?;
        if authority.is_empty() || path.is_empty() {
            return None;
        }

        let relative = Path::new(authority).join(format!("{path}.yaml"));
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        contained.then(|| self.root.join(relative))
    }
}

impl SchemaLoader for DirectorySchemaLoader {
    fn load_schema(&self, tag: &str) -> Result<serde_json::Value, SchemaError> {
        let path = self
            .schema_path(tag)
            .ok_or_else(|| SchemaError::NotFound(tag.to_string()))?;

        debug!("Loading schema for '{}' from {}", tag, path.display());
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SchemaError::NotFound(tag.to_string()));
            }
            Err(source) => return Err(SchemaError::Io { path, source }),
        };

        parse_schema(tag, &text)
    }
}
