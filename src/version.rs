//! Negotiated peer versions
//!
//! Both sides of a binary exchange carry the same `WireVersion` and resolve
//! every gate in the record layout against it. Gates are plain comparisons,
//! never per-version types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{MetadataError, MetadataResult};

/// A peer software version, totally ordered by `(major, minor, revision)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WireVersion {
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
}

impl WireVersion {
    /// First version carrying the optional `context` entry.
    pub const V_2_17_0: WireVersion = WireVersion::new(2, 17, 0);

    /// First version carrying the ingestion pause flag.
    pub const V_3_0_0: WireVersion = WireVersion::new(3, 0, 0);

    /// First version whose extension entries are length-prefixed.
    pub const V_3_2_0: WireVersion = WireVersion::new(3, 2, 0);

    /// Compatibility threshold for skippable extension entries.
    pub const SKIPPABLE_FIELDS_VERSION: WireVersion = WireVersion::V_3_2_0;

    pub const CURRENT: WireVersion = WireVersion::new(3, 3, 0);

    pub const fn new(major: u8, minor: u8, revision: u8) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    /// Numeric identifier, e.g. `3020099` for 3.2.0.
    pub fn id(&self) -> u32 {
        self.major as u32 * 1_000_000 + self.minor as u32 * 10_000 + self.revision as u32 * 100 + 99
    }

    pub fn on_or_after(&self, other: WireVersion) -> bool {
        *self >= other
    }

    pub fn before(&self, other: WireVersion) -> bool {
        *self < other
    }

    /// Whether extension entries written at this version are length-prefixed.
    pub fn supports_skippable_fields(&self) -> bool {
        self.on_or_after(Self::SKIPPABLE_FIELDS_VERSION)
    }
}

impl Default for WireVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for WireVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

impl FromStr for WireVersion {
    type Err = MetadataError;

    fn from_str(s: &str) -> MetadataResult<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(MetadataError::configuration(format!(
                "invalid wire version [{}], expected major.minor.revision",
                s
            )));
        }

        let mut numbers = [0u8; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse::<u8>().map_err(|_| {
                MetadataError::configuration(format!(
                    "invalid wire version [{}]: component [{}] is not a number",
                    s, part
                ))
            })?;
        }

        Ok(WireVersion::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl Serialize for WireVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WireVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
