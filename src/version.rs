//! Lightweight version handling
//!
//! Releases are compared as numeric major.minor.patch tuples. A `v` prefix
//! and anything after a `-` (pre-release tags) are ignored; a string that
//! does not parse compares as `0.0.0` so a malformed release never looks
//! newer than what is installed.

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn parse(input: &str) -> Self {
        let cleaned = input.trim().trim_start_matches('v');
        let cleaned = cleaned.split('-').next().unwrap_or_default();
        if cleaned.is_empty() {
            return Self::default();
        }
        let mut parts = [0u32; 3];
        for (slot, part) in parts.iter_mut().zip(cleaned.split('.')) {
            match part.parse() {
                Ok(n) => *slot = n,
                Err(_) => return Self::default(),
            }
        }
        // More than three dotted parts is not a release we understand
        if cleaned.split('.').count() > 3 {
            return Self::default();
        }
        Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Extract the version from a release asset name, e.g.
/// `PoseScaleTomlGenerator_v0.1.1-beta.zip` -> `0.1.1-beta`. A bare `betaN`
/// stem maps to `0.0.N` (the numbering the earliest releases used).
pub fn version_from_asset_name(name: &str) -> String {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    let ver = stem.rsplit_once('_').map(|(_, ver)| ver).unwrap_or(stem);
    let ver = ver.strip_prefix('v').unwrap_or(ver);

    if let Some(n) = ver.strip_prefix("beta")
        && !n.is_empty()
        && n.chars().all(|c| c.is_ascii_digit())
    {
        return format!("0.0.{n}");
    }
    ver.to_string()
}

/// Prefix a bare version with `v` for display.
pub fn display_version(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(Version::parse("1.2.3"), Version { major: 1, minor: 2, patch: 3 });
        assert_eq!(Version::parse("v0.3.0"), Version { major: 0, minor: 3, patch: 0 });
    }

    #[test]
    fn test_parse_prerelease_suffix_stripped() {
        assert_eq!(Version::parse("v1.0.0-beta"), Version { major: 1, minor: 0, patch: 0 });
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!(Version::parse("1.2"), Version { major: 1, minor: 2, patch: 0 });
        assert_eq!(Version::parse("2"), Version { major: 2, minor: 0, patch: 0 });
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(Version::parse(""), Version::default());
        assert_eq!(Version::parse("abc"), Version::default());
        assert_eq!(Version::parse("1.x.3"), Version::default());
        assert_eq!(Version::parse("1.2.3.4"), Version::default());
    }

    #[test]
    fn test_ordering() {
        assert!(Version::parse("1.0.1") > Version::parse("1.0.0"));
        assert!(Version::parse("0.10.0") > Version::parse("0.9.9"));
        assert!(Version::parse("1.2") < Version::parse("1.2.3"));
        // Malformed latest never wins
        assert!(Version::parse("garbage") < Version::parse("0.0.1"));
    }

    #[test]
    fn test_version_from_asset_name() {
        assert_eq!(version_from_asset_name("PoseScaleTomlGenerator_v0.1.1-beta.zip"), "0.1.1-beta");
        assert_eq!(version_from_asset_name("Tool_v1.2.3.zip"), "1.2.3");
        assert_eq!(version_from_asset_name("v2.0.0.zip"), "2.0.0");
        assert_eq!(version_from_asset_name("beta7.zip"), "0.0.7");
        assert_eq!(version_from_asset_name("Tool_beta12.zip"), "0.0.12");
    }

    #[test]
    fn test_display_version() {
        assert_eq!(display_version("1.2.3"), "v1.2.3");
        assert_eq!(display_version("v1.2.3"), "v1.2.3");
    }
}
