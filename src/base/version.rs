//! Version scheme: mapping between versioned namespaces and version numbers.
//!
//! A library's namespace encodes its version in the last path segment:
//!
//! ```text
//! http://example.org/ns/hotel/v2        -> 2.0.0   (major release)
//! http://example.org/ns/hotel/v02_01    -> 2.1.0   (minor release)
//! http://example.org/ns/hotel/v02_01_03 -> 2.1.3   (patch release)
//! ```
//!
//! All versions sharing a major number share one *canonical* namespace
//! (`.../hotel/v2`). The model indexes libraries by canonical namespace so
//! that several versions of "the same" library can coexist.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A three-part version identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True for `X.0.0` versions.
    pub fn is_major(&self) -> bool {
        self.minor == 0 && self.patch == 0
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    /// Parse `"1"`, `"1.2"` or `"1.2.3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [0u32; 3];
        let mut count = 0;
        for (i, part) in s.trim().split('.').enumerate() {
            if i >= 3 {
                return Err(VersionError::Malformed(s.to_string()));
            }
            parts[i] = part
                .parse()
                .map_err(|_| VersionError::Malformed(s.to_string()))?;
            count += 1;
        }
        if count == 0 {
            return Err(VersionError::Malformed(s.to_string()));
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// Errors from version parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("malformed version identifier: '{0}'")]
    Malformed(String),

    #[error("namespace carries no version segment: '{0}'")]
    Unversioned(String),
}

/// Maps a namespace + version to and from a canonical namespace string.
///
/// Implementations must be pure: the same inputs always produce the same
/// outputs.
pub trait VersionScheme: Send + Sync {
    /// Build the versioned namespace for `base` at `version`.
    fn namespace_for(&self, base: &str, version: &Version) -> String;

    /// Extract the version encoded in a namespace.
    fn version_of(&self, namespace: &str) -> Result<Version, VersionError>;

    /// Strip the version segment, returning the unversioned base.
    fn base_namespace<'a>(&self, namespace: &'a str) -> &'a str;

    /// The namespace shared by every version with the same major number.
    ///
    /// Unversioned namespaces are their own canonical form.
    fn canonical_namespace(&self, namespace: &str) -> String {
        match self.version_of(namespace) {
            Ok(v) => self.namespace_for(
                self.base_namespace(namespace),
                &Version::new(v.major, 0, 0),
            ),
            Err(_) => namespace.to_string(),
        }
    }

    /// True when `candidate` is a later version in the same version chain.
    fn is_later_version(&self, candidate: &str, current: &str) -> bool {
        if self.canonical_namespace(candidate) != self.canonical_namespace(current) {
            return false;
        }
        match (self.version_of(candidate), self.version_of(current)) {
            (Ok(a), Ok(b)) => a > b,
            _ => false,
        }
    }
}

/// The `v{major}` / `v{MM}_{mm}[_{pp}]` scheme.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultVersionScheme;

impl DefaultVersionScheme {
    fn split_segment(namespace: &str) -> Option<(&str, &str)> {
        let trimmed = namespace.trim_end_matches('/');
        let (base, last) = trimmed.rsplit_once('/')?;
        let digits = last.strip_prefix('v').or_else(|| last.strip_prefix('V'))?;
        let well_formed = !digits.is_empty()
            && digits.split('_').all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
        well_formed.then_some((base, digits))
    }
}

impl VersionScheme for DefaultVersionScheme {
    fn namespace_for(&self, base: &str, version: &Version) -> String {
        let base = base.trim_end_matches('/');
        if version.is_major() {
            format!("{base}/v{}", version.major)
        } else if version.patch == 0 {
            format!("{base}/v{:02}_{:02}", version.major, version.minor)
        } else {
            format!(
                "{base}/v{:02}_{:02}_{:02}",
                version.major, version.minor, version.patch
            )
        }
    }

    fn version_of(&self, namespace: &str) -> Result<Version, VersionError> {
        let (_, digits) = Self::split_segment(namespace)
            .ok_or_else(|| VersionError::Unversioned(namespace.to_string()))?;
        let parts: Vec<u32> = digits
            .split('_')
            .map(|p| p.parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| VersionError::Malformed(digits.to_string()))?;
        match parts.as_slice() {
            [major] => Ok(Version::new(*major, 0, 0)),
            [major, minor] => Ok(Version::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Version::new(*major, *minor, *patch)),
            _ => Err(VersionError::Malformed(digits.to_string())),
        }
    }

    fn base_namespace<'a>(&self, namespace: &'a str) -> &'a str {
        Self::split_segment(namespace)
            .map(|(base, _)| base)
            .unwrap_or(namespace)
    }
}
