use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Invalid version '{input}': expected 3 components, found {found}")]
    WrongComponentCount { input: String, found: usize },

    #[error("Invalid version '{input}': '{component}' is not a non-negative integer")]
    InvalidComponent { input: String, component: String },

    #[error("Unsupported version '{0}': pre-release and build metadata are not modeled")]
    Prerelease(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("Empty version specification")]
    Empty,

    #[error("Unknown operator '{operator}' in version specification '{input}'")]
    UnknownOperator { input: String, operator: String },

    #[error("Invalid version in specification: {0}")]
    Version(#[from] VersionError),
}
