//! API version parsing and the provider/consumer compatibility rule.
//!
//! Version strings look like `v1.2.3` or `1.2.3`. Anything after the third
//! number is ignored, so `1.2.3-beta` parses as `1.2.3`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ExtError;

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v?([0-9]+)\.([0-9]+)\.([0-9]+)").unwrap());

/// A parsed `MAJOR.MINOR.PATCH` API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemVer {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    pub fn parse(input: &str) -> Result<Self, ExtError> {
        let caps = VERSION_PATTERN
            .captures(input.trim())
            .ok_or_else(|| ExtError::MalformedVersion(input.to_string()))?;

        let component = |idx: usize| -> Result<u32, ExtError> {
            caps[idx]
                .parse::<u32>()
                .map_err(|_| ExtError::MalformedVersion(input.to_string()))
        };

        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Whether a callback written against `consumer` can run on a namespace
    /// declared at `self`.
    ///
    /// Majors must match exactly; the provider's minor must be at least the
    /// consumer's. Patch never participates.
    pub fn is_compatible_with(&self, consumer: &SemVer) -> bool {
        self.major == consumer.major && self.minor >= consumer.minor
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = ExtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SemVer {
    type Error = ExtError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SemVer> for String {
    fn from(value: SemVer) -> Self {
        value.to_string()
    }
}

/// Check a provider API version string against a consumer API version string.
pub fn version_check(provider_api: &str, consumer_api: &str) -> Result<bool, ExtError> {
    let provider = SemVer::parse(provider_api)?;
    let consumer = SemVer::parse(consumer_api)?;
    Ok(provider.is_compatible_with(&consumer))
}
