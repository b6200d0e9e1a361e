//! Version tag utilities
//!
//! Catalog versions and mapping versions are both written as `v<semver>`
//! tags (`v1.0.0`). Parsing accepts the bare form too.

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// A `v`-prefixed semantic version tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionTag {
    version: Version,
}

impl VersionTag {
    /// Create from a semantic version
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// Create from a version string, with or without a leading `v`
    pub fn parse(version_str: &str) -> Result<Self, RegistryError> {
        let bare = version_str.strip_prefix('v').unwrap_or(version_str);
        Version::parse(bare)
            .map(Self::new)
            .map_err(|e| RegistryError::InvalidVersion(format!("{version_str}: {e}")))
    }

    /// Returns true when `candidate` parses as a version tag.
    pub fn is_tag(candidate: &str) -> bool {
        Self::parse(candidate).is_ok()
    }

    /// The underlying semantic version
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Get the tag string (e.g., "v1.2.3")
    pub fn tag_string(&self) -> String {
        format!("v{}", self.version)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.version)
    }
}

impl FromStr for VersionTag {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Sort version strings by semver, placing unparsable tags last in
/// lexical order.
pub fn sort_tags(tags: &mut [String]) {
    tags.sort_by(|a, b| match (VersionTag::parse(a), VersionTag::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
}
