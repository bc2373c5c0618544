use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::version::SemVer;

/// Whether a registered callback takes part in dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallbackState {
    Enabled,
    /// Excluded from dispatch because its API version does not fit the
    /// namespace's declared version. A later redeclaration may re-enable it.
    DisabledApi,
}

impl CallbackState {
    /// State of a callback written against `callback_api` in a namespace that
    /// has declared `declared` (or nothing yet).
    pub fn compute(declared: Option<&SemVer>, callback_api: &SemVer) -> Self {
        match declared {
            Some(provider) if !provider.is_compatible_with(callback_api) => Self::DisabledApi,
            _ => Self::Enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::DisabledApi => "disabled-api",
        }
    }
}

impl fmt::Display for CallbackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `add_extension` does when an extension name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Reject the whole call: no metadata, no hooks, no plugins.
    #[default]
    Reject,
    /// Drop the duplicate metadata but still register its callbacks.
    MetadataOnly,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "metadata-only" | "metadata_only" => Ok(Self::MetadataOnly),
            other => Err(format!("unknown duplicate extension policy: {other}")),
        }
    }
}
