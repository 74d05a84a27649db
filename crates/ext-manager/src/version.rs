//! Dotted-numeric versions for host compatibility checks.
//!
//! Versions are compared component-wise as unsigned integers, with missing
//! trailing components treated as `0`, so `1.2` and `1.2.0` are equal and
//! `1.10` is newer than `1.9`.
//!
//! ```
//! use ext_manager::version::DottedVersion;
//!
//! let host: DottedVersion = "2.4".parse().unwrap();
//! let required: DottedVersion = "2.3.9".parse().unwrap();
//! assert!(host.satisfies_minimum(&required));
//! ```

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A parsed `major.minor.patch...` version of arbitrary length.
#[derive(Debug, Clone)]
pub struct DottedVersion {
    components: Vec<u64>,
    raw: String,
}

impl DottedVersion {
    /// Parse a dotted-numeric version string.
    ///
    /// Surrounding whitespace is ignored. Every component must be a
    /// non-empty run of ASCII digits.
    pub fn parse(version: &str) -> Result<Self> {
        let raw = version.trim();
        let invalid = |reason: &str| Error::InvalidVersion {
            version: version.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("empty version"));
        }

        let components = raw
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("components must be non-negative integers"));
                }
                part.parse::<u64>()
                    .map_err(|_| invalid("component out of range"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            components,
            raw: raw.to_string(),
        })
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether a host running `self` meets a `required` minimum.
    pub fn satisfies_minimum(&self, required: &DottedVersion) -> bool {
        self >= required
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let left = self.components.get(i).copied().unwrap_or(0);
                let right = other.components.get(i).copied().unwrap_or(0);
                left.cmp(&right)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DottedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DottedVersion {}

impl FromStr for DottedVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
