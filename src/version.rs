//! Major-version parsing for runtime version strings.
//!
//! Version strings come in two historical shapes: a legacy two-part scheme
//! where the feature number is the second segment (`"1.8.0_392"` is feature
//! release 8) and the modern scheme where it leads (`"11.0.21"`, `"21-ea"`,
//! `"9"`). Only the feature number matters for compatibility gating, so
//! parsing collapses everything else.
//!
//! Parsing never fails: an empty or unparseable string yields
//! [`MajorVersion::ZERO`], which orders below every real release. Absence of
//! a version is itself meaningful data ("oldest possible"), not an error.

use std::fmt;

/// The feature number of a runtime release, used for coarse compatibility
/// gating. Plain integer equality and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MajorVersion(u32);

impl MajorVersion {
    /// The version reported for absent or unparseable input.
    pub const ZERO: MajorVersion = MajorVersion(0);

    /// Parse the major version out of a raw version string.
    ///
    /// - Legacy scheme (`"1.x.y_z"`): the second `.`-delimited segment.
    /// - Modern scheme (`"x.y.z"`, `"x"`, `"x-suffix"`): the leading integer
    ///   of the first segment, trailing non-digits stripped.
    /// - Anything else: [`MajorVersion::ZERO`].
    pub fn parse(raw: &str) -> MajorVersion {
        if raw.is_empty() {
            return Self::ZERO;
        }
        if let Some(rest) = raw.strip_prefix("1.") {
            let segment = rest.split('.').next().unwrap_or(rest);
            return segment.parse().map(MajorVersion).unwrap_or(Self::ZERO);
        }
        let head = raw.split('.').next().unwrap_or(raw);
        let digits: &str = {
            let end = head
                .char_indices()
                .find(|(_, c)| !c.is_ascii_digit())
                .map(|(i, _)| i)
                .unwrap_or(head.len());
            &head[..end]
        };
        digits.parse().map(MajorVersion).unwrap_or(Self::ZERO)
    }

    /// Parse an optional version string, resolving absence to zero.
    pub fn parse_opt(raw: Option<&str>) -> MajorVersion {
        raw.map(Self::parse).unwrap_or(Self::ZERO)
    }

    /// The numeric feature number.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for MajorVersion {
    fn from(value: u32) -> Self {
        MajorVersion(value)
    }
}

impl fmt::Display for MajorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
