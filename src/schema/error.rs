use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("No schema found for tag '{0}'")]
    NotFound(String),

    #[error("Failed to read schema {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema for tag '{tag}' is not valid YAML: {source}")]
    Yaml {
        tag: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Schema for tag '{0}' is not a mapping")]
    NotAMapping(String),

    #[error("Schema requested as '{requested}' declares tag '{declared}'")]
    TagMismatch { requested: String, declared: String },
}
