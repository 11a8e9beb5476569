//! Version algebra for the ASDF Standard and its schema tags
//!
//! Everything above this layer (version maps, tag resolution, the converter)
//! accepts versions in any of three interchangeable forms: a dotted string
//! (`"1.2.0"`), an integer triple (`(1, 2, 0)` or `[1, 2, 0]`), or an
//! [`AsdfVersion`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │ VersionLike │────▶│ AsdfVersion │  (normalize, then one total order)
//! │ (&str, ...) │     └─────────────┘
//! └─────────────┘            ▲
//!                            │
//!                     ┌─────────────┐
//!                     │  AsdfSpec   │  (match / select / filter)
//!                     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`value`]: `AsdfVersion` and the `VersionLike` normalization trait
//! - [`spec`]: `AsdfSpec` comparator + threshold range specifications
//! - [`error`]: Error types for version and spec parsing

pub mod error;
pub mod spec;
pub mod value;

pub use error::{SpecError, VersionError};
pub use spec::{AsdfSpec, Comparator, SpecFilter};
pub use value::{AsdfVersion, VersionLike};
