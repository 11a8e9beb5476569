//! Version maps: which tag versions each ASDF Standard version requires

use std::collections::BTreeMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registry::builtin;
use crate::registry::error::RegistryError;
use crate::version::{AsdfVersion, VersionError, VersionLike};

/// Tags under this prefix belong to [`SchemaCategory::Core`]
pub const CORE_TAG_PREFIX: &str = "tag:stsci.edu:asdf/core/";

/// Separator between a tag-base and its version in a qualified tag
pub const TAG_VERSION_SEPARATOR: char = '-';

/// Partition of the tags in a version map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaCategory {
    /// Schemas of the file format itself (`core/*`)
    Core,
    /// Every other schema family shipped with the standard
    Standard,
}

impl SchemaCategory {
    pub const ALL: [SchemaCategory; 2] = [SchemaCategory::Core, SchemaCategory::Standard];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaCategory::Core => "core",
            SchemaCategory::Standard => "standard",
        }
    }

    /// Category of a tag-base, decided by its prefix
    pub fn of_tag(tag_base: &str) -> Self {
        if tag_base.starts_with(CORE_TAG_PREFIX) {
            SchemaCategory::Core
        } else {
            SchemaCategory::Standard
        }
    }
}

impl std::fmt::Display for SchemaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join a tag-base and a version into a fully qualified tag
///
/// `join_tag_version("tag:stsci.edu:asdf/core/ndarray", "1.0.0")` gives
/// `"tag:stsci.edu:asdf/core/ndarray-1.0.0"`.
pub fn join_tag_version<V: VersionLike + ?Sized>(
    tag_base: &str,
    tag_version: &V,
) -> Result<String, VersionError> {
    Ok(qualify(tag_base, tag_version.to_version()?))
}

pub(crate) fn qualify(tag_base: &str, tag_version: AsdfVersion) -> String {
    format!("{tag_base}{TAG_VERSION_SEPARATOR}{tag_version}")
}

/// Split a qualified tag into its tag-base and version
///
/// Returns `(tag, None)` when the tag carries no parsable version suffix.
pub fn split_tag_version(tag: &str) -> (&str, Option<AsdfVersion>) {
    match tag.rsplit_once(TAG_VERSION_SEPARATOR) {
        Some((base, suffix)) => match AsdfVersion::parse(suffix) {
            Ok(version) => (base, Some(version)),
            Err(_) => (tag, None),
        },
        None => (tag, None),
    }
}

/// Tag table bound to one ASDF Standard version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMap {
    standard_version: AsdfVersion,
    file_format: AsdfVersion,
    yaml_version: String,
    core: IndexMap<String, AsdfVersion>,
    standard: IndexMap<String, AsdfVersion>,
}

/// On-disk layout of a `version_map-X.Y.Z.yaml` document
#[derive(Debug, Deserialize)]
struct VersionMapDocument {
    #[serde(rename = "FILE_FORMAT")]
    file_format: AsdfVersion,
    #[serde(rename = "YAML_VERSION")]
    yaml_version: String,
    #[serde(default)]
    tags: IndexMap<String, AsdfVersion>,
}

impl VersionMap {
    /// Build a map, partitioning `tags` into categories by prefix
    pub fn new<I, S>(
        standard_version: AsdfVersion,
        file_format: AsdfVersion,
        yaml_version: impl Into<String>,
        tags: I,
    ) -> Self
    where
        I: IntoIterator<Item = (S, AsdfVersion)>,
        S: Into<String>,
    {
        let mut core = IndexMap::new();
        let mut standard = IndexMap::new();
        for (tag_base, tag_version) in tags {
            let tag_base = tag_base.into();
            match SchemaCategory::of_tag(&tag_base) {
                SchemaCategory::Core => core.insert(tag_base, tag_version),
                SchemaCategory::Standard => standard.insert(tag_base, tag_version),
            };
        }

        Self {
            standard_version,
            file_format,
            yaml_version: yaml_version.into(),
            core,
            standard,
        }
    }

    /// Read a map in the `FILE_FORMAT` / `YAML_VERSION` / `tags` layout
    pub fn from_yaml(standard_version: AsdfVersion, text: &str) -> Result<Self, RegistryError> {
        let document: VersionMapDocument =
            serde_yaml::from_str(text).map_err(|source| RegistryError::InvalidVersionMap {
                version: standard_version,
                source,
            })?;

        Ok(Self::new(
            standard_version,
            document.file_format,
            document.yaml_version,
            document.tags,
        ))
    }

    pub fn standard_version(&self) -> AsdfVersion {
        self.standard_version
    }

    /// Version written in the `#ASDF` file header
    pub fn file_format(&self) -> AsdfVersion {
        self.file_format
    }

    pub fn yaml_version(&self) -> &str {
        &self.yaml_version
    }

    /// Tag-base to tag-version table for one category
    pub fn category(&self, category: SchemaCategory) -> &IndexMap<String, AsdfVersion> {
        match category {
            SchemaCategory::Core => &self.core,
            SchemaCategory::Standard => &self.standard,
        }
    }

    pub fn tag_version(&self, tag_base: &str) -> Option<AsdfVersion> {
        self.category(SchemaCategory::of_tag(tag_base))
            .get(tag_base)
            .copied()
    }

    /// Fully qualified tags required in `category`, in table order
    pub fn qualified_tags(&self, category: SchemaCategory) -> impl Iterator<Item = String> + '_ {
        self.category(category)
            .iter()
            .map(|(tag_base, tag_version)| qualify(tag_base, *tag_version))
    }
}

/// All known version maps, keyed by ASDF Standard version
#[derive(Debug, Clone, Default)]
pub struct VersionMapRegistry {
    maps: BTreeMap<AsdfVersion, VersionMap>,
}

static BUILTIN: LazyLock<VersionMapRegistry> = LazyLock::new(|| {
    let maps = builtin::version_maps()
        .into_iter()
        .map(|map| (map.standard_version(), map))
        .collect::<BTreeMap<_, _>>();
    debug!("Loaded {} built-in version maps", maps.len());
    VersionMapRegistry { maps }
});

impl VersionMapRegistry {
    /// Build a registry, rejecting two maps for the same standard version
    pub fn new(maps: impl IntoIterator<Item = VersionMap>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for map in maps {
            let version = map.standard_version();
            if registry.maps.insert(version, map).is_some() {
                return Err(RegistryError::DuplicateStandardVersion(version));
            }
        }
        Ok(registry)
    }

    /// The process-wide registry of ASDF Standard versions this crate supports
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Exact lookup of the map for `standard_version`
    pub fn get_version_map<V: VersionLike + ?Sized>(
        &self,
        standard_version: &V,
    ) -> Result<&VersionMap, RegistryError> {
        let version = standard_version.to_version()?;
        self.maps
            .get(&version)
            .ok_or(RegistryError::UnsupportedStandardVersion(version))
    }

    pub fn is_supported<V: VersionLike + ?Sized>(&self, standard_version: &V) -> bool {
        standard_version
            .to_version()
            .is_ok_and(|version| self.maps.contains_key(&version))
    }

    /// Supported standard versions in ascending order
    pub fn supported_versions(&self) -> impl Iterator<Item = AsdfVersion> + '_ {
        self.maps.keys().copied()
    }

    /// Newest supported standard version
    pub fn latest_version(&self) -> Option<AsdfVersion> {
        self.maps.keys().next_back().copied()
    }

    pub fn version_maps(&self) -> impl Iterator<Item = &VersionMap> {
        self.maps.values()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

/// Look up a version map in the built-in registry
pub fn get_version_map<V: VersionLike + ?Sized>(
    standard_version: &V,
) -> Result<&'static VersionMap, RegistryError> {
    VersionMapRegistry::builtin().get_version_map(standard_version)
}

/// Supported standard versions of the built-in registry, ascending
pub fn supported_versions() -> Vec<AsdfVersion> {
    VersionMapRegistry::builtin().supported_versions().collect()
}

/// Standard version used when a caller or document does not name one
pub fn default_version() -> AsdfVersion {
    builtin::DEFAULT_STANDARD_VERSION
}
