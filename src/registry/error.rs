use thiserror::Error;

use crate::version::{AsdfVersion, VersionError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("ASDF Standard version {0} is not supported")]
    UnsupportedStandardVersion(AsdfVersion),

    #[error("ASDF Standard version {0} is registered more than once")]
    DuplicateStandardVersion(AsdfVersion),

    #[error("Invalid version map for ASDF Standard {version}: {source}")]
    InvalidVersionMap {
        version: AsdfVersion,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Version(#[from] VersionError),
}
