//! Version compatibility core for the ASDF file format
//!
//! - [`version`]: version values and comparator range specifications
//! - [`registry`]: which tag versions each ASDF Standard version requires
//! - [`types`]: tag to handler resolution with nearest-version fallback
//! - [`schema`]: schema loading for the integrity check
//! - [`integrity`]: cross-checks version maps against schemas and handlers
//! - [`convert`]: ASDF-in-FITS to standalone ASDF extraction

pub mod config;
pub mod convert;
pub mod integrity;
pub mod logging;
pub mod registry;
pub mod schema;
pub mod types;
pub mod version;
