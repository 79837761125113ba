//! Identity verification tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// How strongly the World ID credential was verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    /// Biometric verification at an Orb.
    Orb,
    /// Device-level verification.
    Device,
}

impl VerificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orb => "orb",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationLevel {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orb" => Ok(Self::Orb),
            "device" => Ok(Self::Device),
            other => Err(TypesError::UnknownVerificationLevel(other.to_string())),
        }
    }
}
