//! Type resolution
//!
//! Maps fully qualified YAML tags to the handlers registered by extensions.
//! When a document names a tag-version nobody registered, the handler of the
//! nearest lower version of the same family is used and the caller's
//! [`ResolutionContext`] is told about the substitution.

pub mod core;
pub mod extension;
pub mod index;

pub use self::core::CoreExtension;
pub use extension::{Extension, ExtensionType, VersionedType};
pub use index::{DocumentContext, ResolutionContext, SharedTypeIndex, TypeIndex};
