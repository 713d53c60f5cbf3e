//! Submit policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MapperError;

/// When display edits reach the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SubmitPolicy {
    /// Every edit is written to the model immediately.
    #[default]
    Auto,
    /// Edits stay in the display until `Mapper::submit`.
    Manual,
}

impl SubmitPolicy {
    /// Lower-case name, as used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitPolicy::Auto => "auto",
            SubmitPolicy::Manual => "manual",
        }
    }
}

impl fmt::Display for SubmitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmitPolicy {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SubmitPolicy::Auto),
            "manual" => Ok(SubmitPolicy::Manual),
            _ => Err(MapperError::InvalidPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for SubmitPolicy {
    type Error = MapperError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Numeric codes `0` (auto) and `1` (manual).
impl TryFrom<u8> for SubmitPolicy {
    type Error = MapperError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SubmitPolicy::Auto),
            1 => Ok(SubmitPolicy::Manual),
            other => Err(MapperError::InvalidPolicy(other.to_string())),
        }
    }
}

impl From<SubmitPolicy> for &'static str {
    fn from(policy: SubmitPolicy) -> Self {
        policy.as_str()
    }
}
