//! Tag to handler resolution

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tracing::{debug, warn};

use crate::registry::version_map::{qualify, split_tag_version};
use crate::types::extension::{Extension, ExtensionType};
use crate::version::AsdfVersion;

/// Ambient state a lookup needs from its caller
pub trait ResolutionContext {
    /// Name of the document being read, if any
    fn document_name(&self) -> Option<&str>;

    /// Called when [`TypeIndex::resolve`] answers `requested` with the handler
    /// registered for `resolved`
    fn on_version_mismatch(&self, requested: &str, resolved: &str) {
        warn!(
            "{}: no handler for '{}', falling back to '{}'",
            self.document_name().unwrap_or("<unnamed>"),
            requested,
            resolved
        );
    }
}

/// Context for reading one document; warns once per mismatched tag
#[derive(Debug, Default)]
pub struct DocumentContext {
    name: Option<String>,
    warned: Mutex<HashSet<String>>,
}

impl DocumentContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            warned: Mutex::default(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Requested tags that were answered by a different version, sorted
    pub fn mismatched_tags(&self) -> Vec<String> {
        let warned = self.warned.lock().unwrap_or_else(PoisonError::into_inner);
        let mut tags: Vec<String> = warned.iter().cloned().collect();
        tags.sort();
        tags
    }
}

impl ResolutionContext for DocumentContext {
    fn document_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn on_version_mismatch(&self, requested: &str, resolved: &str) {
        let mut warned = self.warned.lock().unwrap_or_else(PoisonError::into_inner);
        if warned.insert(requested.to_string()) {
            warn!(
                "{}: no handler for '{}', falling back to '{}'",
                self.name.as_deref().unwrap_or("<unnamed>"),
                requested,
                resolved
            );
        }
    }
}

/// Immutable table of tag bindings
///
/// Built during initialization, then shared read-only. Use
/// [`SharedTypeIndex`] to swap in a rebuilt index.
#[derive(Clone, Default)]
pub struct TypeIndex {
    by_tag: HashMap<String, Arc<dyn ExtensionType>>,
    /// Registered versions per tag-base, ascending
    versions_by_base: HashMap<String, Vec<AsdfVersion>>,
}

impl fmt::Debug for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.by_tag.keys().collect();
        tags.sort();
        f.debug_struct("TypeIndex").field("tags", &tags).finish()
    }
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_extensions<'a>(extensions: impl IntoIterator<Item = &'a dyn Extension>) -> Self {
        let mut index = Self::new();
        for extension in extensions {
            let types = extension.types();
            debug!(
                "Registering {} handlers from extension '{}'",
                types.len(),
                extension.name()
            );
            for handler in types {
                index.register(handler);
            }
        }
        index
    }

    /// Bind `handler` under the tag it declares
    ///
    /// Returns the handler previously bound to that tag, if any.
    pub fn register(&mut self, handler: Arc<dyn ExtensionType>) -> Option<Arc<dyn ExtensionType>> {
        let tag = handler.yaml_tag().to_string();
        self.register_as(tag, handler)
    }

    /// Bind `handler` under an explicit lookup tag
    ///
    /// Extensions may map extra tags onto an existing handler; the integrity
    /// check reports such bindings when the declared tag differs.
    pub fn register_as(
        &mut self,
        tag: impl Into<String>,
        handler: Arc<dyn ExtensionType>,
    ) -> Option<Arc<dyn ExtensionType>> {
        let tag = tag.into();
        if let (base, Some(version)) = split_tag_version(&tag) {
            let versions = self.versions_by_base.entry(base.to_string()).or_default();
            if let Err(position) = versions.binary_search(&version) {
                versions.insert(position, version);
            }
        }

        let previous = self.by_tag.insert(tag, handler);
        if let Some(previous) = &previous {
            warn!(
                "Handler for '{}' replaced by a later registration",
                previous.yaml_tag()
            );
        }
        previous
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Registered lookup tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.by_tag.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Handler bound to exactly `tag`, without version fallback
    pub fn get(&self, tag: &str) -> Option<&Arc<dyn ExtensionType>> {
        self.by_tag.get(tag)
    }

    /// Find the handler for `tag`
    ///
    /// When no handler is bound to the exact tag, the handler for the greatest
    /// registered version of the same tag-base below the requested version is
    /// returned (or the lowest registered version when none is below), and
    /// `ctx` is notified of the mismatch. `None` means no version of the tag
    /// family is registered at all.
    pub fn resolve(&self, tag: &str, ctx: &dyn ResolutionContext) -> Option<Arc<dyn ExtensionType>> {
        if let Some(handler) = self.by_tag.get(tag) {
            return Some(Arc::clone(handler));
        }

        let (base, Some(version)) = split_tag_version(tag) else {
            debug!("No handler for unversioned tag '{}'", tag);
            return None;
        };
        // "widget-01.0.0" names the same version as "widget-1.0.0"
        if let Some(handler) = self.by_tag.get(&qualify(base, version)) {
            return Some(Arc::clone(handler));
        }
        let versions = self.versions_by_base.get(base)?;
        let position = versions.partition_point(|candidate| *candidate < version);
        let best = versions.get(position.saturating_sub(1))?;

        let best_tag = qualify(base, *best);
        let handler = self.by_tag.get(&best_tag)?;
        ctx.on_version_mismatch(tag, &best_tag);
        Some(Arc::clone(handler))
    }
}

/// A [`TypeIndex`] that can be replaced while readers hold earlier snapshots
pub struct SharedTypeIndex {
    snapshot: ArcSwap<TypeIndex>,
}

impl SharedTypeIndex {
    pub fn new(index: TypeIndex) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(index),
        }
    }

    /// Current snapshot; stays valid after a later [`SharedTypeIndex::replace`]
    pub fn snapshot(&self) -> Arc<TypeIndex> {
        self.snapshot.load_full()
    }

    /// Swap in a rebuilt index and return the previous one
    pub fn replace(&self, index: TypeIndex) -> Arc<TypeIndex> {
        debug!("Replacing type index ({} tags)", index.len());
        self.snapshot.swap(Arc::new(index))
    }

    pub fn resolve(&self, tag: &str, ctx: &dyn ResolutionContext) -> Option<Arc<dyn ExtensionType>> {
        self.snapshot.load().resolve(tag, ctx)
    }
}

impl fmt::Debug for SharedTypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTypeIndex")
            .field("snapshot", &self.snapshot.load())
            .finish()
    }
}
