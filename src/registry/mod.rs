//! Version map registry
//!
//! Binds each supported ASDF Standard version to the tag-version every
//! schema family must use, split into the `core` and `standard` categories.
//! The table is built once from static data and shared read-only.
//!
//! # Modules
//!
//! - [`version_map`]: `VersionMap`, `VersionMapRegistry` and tag joining/splitting
//! - [`builtin`]: The built-in table for ASDF Standard 1.0.0 to 1.5.0
//! - [`error`]: Error types for registry lookups

pub mod builtin;
pub mod error;
pub mod version_map;

pub use error::RegistryError;
pub use version_map::{
    CORE_TAG_PREFIX, SchemaCategory, VersionMap, VersionMapRegistry, default_version,
    get_version_map, join_tag_version, split_tag_version, supported_versions,
};
