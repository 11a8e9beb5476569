//! Handler descriptors and the extensions that provide them

use std::fmt;
use std::sync::Arc;

use crate::registry::version_map::qualify;
use crate::version::AsdfVersion;

/// A registered reader/writer for instances of one fully qualified tag
pub trait ExtensionType: Send + Sync + fmt::Debug {
    /// The tag this handler declares it reads and writes
    fn yaml_tag(&self) -> &str;

    /// Name of the type family, shared by every version of the same tag-base
    fn type_name(&self) -> &str;
}

/// Handler for one version of a tag family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedType {
    name: String,
    tag_base: String,
    version: AsdfVersion,
    yaml_tag: String,
}

impl VersionedType {
    pub fn new(name: impl Into<String>, tag_base: impl Into<String>, version: AsdfVersion) -> Self {
        let tag_base = tag_base.into();
        let yaml_tag = qualify(&tag_base, version);
        Self {
            name: name.into(),
            tag_base,
            version,
            yaml_tag,
        }
    }

    /// One handler per supported version, each declaring its own tag
    pub fn family(name: &str, tag_base: &str, versions: &[AsdfVersion]) -> Vec<Self> {
        versions
            .iter()
            .map(|version| Self::new(name, tag_base, *version))
            .collect()
    }

    pub fn tag_base(&self) -> &str {
        &self.tag_base
    }

    pub fn version(&self) -> AsdfVersion {
        self.version
    }
}

impl ExtensionType for VersionedType {
    fn yaml_tag(&self) -> &str {
        &self.yaml_tag
    }

    fn type_name(&self) -> &str {
        &self.name
    }
}

/// A source of handlers, as produced by extension discovery
pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    /// Every handler this extension registers
    fn types(&self) -> Vec<Arc<dyn ExtensionType>>;
}
