//! World ID nullifier hash.
//!
//! The nullifier is the only stable per-person, per-app identifier the
//! verification service hands back, so it doubles as the user key.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A `0x`-prefixed field element, stored lowercase.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NullifierHash(String);

impl NullifierHash {
    /// Maximum number of hex digits (a 256-bit value).
    pub const MAX_DIGITS: usize = 64;

    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidNullifier(raw.to_string()))?;
        if digits.is_empty()
            || digits.len() > Self::MAX_DIGITS
            || !digits.bytes().all(|c| c.is_ascii_hexdigit())
        {
            return Err(TypesError::InvalidNullifier(raw.to_string()));
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NullifierHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NullifierHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = &self.0[..self.0.len().min(12)];
        write!(f, "NullifierHash({shown}..)")
    }
}

impl TryFrom<String> for NullifierHash {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<NullifierHash> for String {
    fn from(n: NullifierHash) -> Self {
        n.0
    }
}
