//! Three-component version identifiers
//!
//! [`AsdfVersion`] is the single canonical form. Strings, integer triples and
//! integer slices are accepted wherever a version is expected through the
//! [`VersionLike`] trait, and compare against `AsdfVersion` in both operand
//! orders.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::version::error::VersionError;

/// A `major.minor.patch` version as used by the ASDF Standard and its tags
///
/// Ordering is lexicographic over `(major, minor, patch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AsdfVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl AsdfVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted version string such as `"1.2.0"`.
    ///
    /// Exactly three components are required, each a non-negative integer.
    /// Leading zeros are dropped before the text is handed to
    /// [`semver::Version::parse`].
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let parts: Vec<&str> = input.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(VersionError::WrongComponentCount {
                input: input.to_string(),
                found: parts.len(),
            });
        };

        let canonical = format!(
            "{}.{}.{}",
            canonical_component(input, major)?,
            canonical_component(input, minor)?,
            canonical_component(input, patch)?,
        );
        let version = semver::Version::parse(&canonical).map_err(|e| {
            // digits only at this point, so the one failure left is a component past u64
            let component = parts
                .iter()
                .find(|part| part.parse::<u64>().is_err())
                .map_or_else(|| e.to_string(), |part| part.to_string());
            VersionError::InvalidComponent {
                input: input.to_string(),
                component,
            }
        })?;
        Self::try_from(&version)
    }

    /// Build a version from a sequence of exactly three integers.
    pub fn from_components(components: &[u64]) -> Result<Self, VersionError> {
        match components {
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(VersionError::WrongComponentCount {
                input: format!("{components:?}"),
                found: components.len(),
            }),
        }
    }

    pub const fn as_tuple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

fn canonical_component<'a>(input: &str, component: &'a str) -> Result<&'a str, VersionError> {
    // semver would report "1.+1.0" as a pre-release, not a bad component
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::InvalidComponent {
            input: input.to_string(),
            component: component.to_string(),
        });
    }
    let trimmed = component.trim_start_matches('0');
    Ok(if trimmed.is_empty() { "0" } else { trimmed })
}

impl fmt::Display for AsdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for AsdfVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<(u64, u64, u64)> for AsdfVersion {
    fn from((major, minor, patch): (u64, u64, u64)) -> Self {
        Self::new(major, minor, patch)
    }
}

impl From<[u64; 3]> for AsdfVersion {
    fn from([major, minor, patch]: [u64; 3]) -> Self {
        Self::new(major, minor, patch)
    }
}

impl From<AsdfVersion> for semver::Version {
    fn from(version: AsdfVersion) -> Self {
        semver::Version::new(version.major, version.minor, version.patch)
    }
}

impl TryFrom<&semver::Version> for AsdfVersion {
    type Error = VersionError;

    fn try_from(version: &semver::Version) -> Result<Self, Self::Error> {
        if !version.pre.is_empty() || !version.build.is_empty() {
            return Err(VersionError::Prerelease(version.to_string()));
        }
        Ok(Self::new(version.major, version.minor, version.patch))
    }
}

/// Any value that can be normalized into an [`AsdfVersion`]
pub trait VersionLike {
    fn to_version(&self) -> Result<AsdfVersion, VersionError>;
}

impl VersionLike for AsdfVersion {
    fn to_version(&self) -> Result<AsdfVersion, VersionError> {
        Ok(*self)
    }
}

impl VersionLike for str {
    fn to_version(&self) -> Result<AsdfVersion, VersionError> {
        AsdfVersion::parse(self)
    }
}

impl VersionLike for String {
    fn to_version(&self) -> Result<AsdfVersion, VersionError> {
        AsdfVersion::parse(self)
    }
}

impl VersionLike for (u64, u64, u64) {
    fn to_version(&self) -> Result<AsdfVersion, VersionError> {
        Ok(AsdfVersion::from(*self))
    }
}

impl VersionLike for [u64; 3] {
    fn to_version(&self) -> Result<AsdfVersion, VersionError> {
        Ok(AsdfVersion::from(*self))
    }
}

impl VersionLike for [u64] {
    fn to_version(&self) -> Result<AsdfVersion, VersionError> {
        AsdfVersion::from_components(self)
    }
}

impl VersionLike for Vec<u64> {
    fn to_version(&self) -> Result<AsdfVersion, VersionError> {
        AsdfVersion::from_components(self)
    }
}

impl<T: VersionLike + ?Sized> VersionLike for &T {
    fn to_version(&self) -> Result<AsdfVersion, VersionError> {
        (**self).to_version()
    }
}

/// Equality and ordering between `AsdfVersion` and another representation,
/// in both operand orders. The other side is normalized first; a value that
/// does not parse is unequal and unordered.
macro_rules! compare_with_version {
    ($($other:ty),+ $(,)?) => {$(
        impl PartialEq<$other> for AsdfVersion {
            fn eq(&self, other: &$other) -> bool {
                other.to_version().is_ok_and(|version| *self == version)
            }
        }

        impl PartialEq<AsdfVersion> for $other {
            fn eq(&self, other: &AsdfVersion) -> bool {
                <AsdfVersion as PartialEq<$other>>::eq(other, self)
            }
        }

        impl PartialOrd<$other> for AsdfVersion {
            fn partial_cmp(&self, other: &$other) -> Option<Ordering> {
                other.to_version().ok().map(|version| self.cmp(&version))
            }
        }

        impl PartialOrd<AsdfVersion> for $other {
            fn partial_cmp(&self, other: &AsdfVersion) -> Option<Ordering> {
                <AsdfVersion as PartialOrd<$other>>::partial_cmp(other, self).map(Ordering::reverse)
            }
        }
    )+};
}

compare_with_version!(str, &str, String, (u64, u64, u64), [u64; 3]);

impl Serialize for AsdfVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Text(String),
    Components(Vec<u64>),
}

impl<'de> Deserialize<'de> for AsdfVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = match VersionRepr::deserialize(deserializer)? {
            VersionRepr::Text(text) => AsdfVersion::parse(&text),
            VersionRepr::Components(components) => AsdfVersion::from_components(&components),
        };
        version.map_err(serde::de::Error::custom)
    }
}
