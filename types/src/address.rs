//! Ethereum-style wallet address (`0x` + 40 hex characters).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 20-byte wallet address.
///
/// Parsing accepts any hex casing (checksummed or not). The canonical
/// textual form is lowercase with a `0x` prefix, which is also what gets
/// persisted and compared.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress([u8; 20]);

impl WalletAddress {
    /// The standard prefix for hex-encoded addresses.
    pub const PREFIX: &'static str = "0x";

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a `0x`-prefixed, 40 hex character address.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let digits = raw
            .strip_prefix(Self::PREFIX)
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddress(raw.to_string()))?;
        if digits.len() != 40 {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| TypesError::InvalidAddress(raw.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletAddress({self})")
    }
}

impl FromStr for WalletAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.to_string()
    }
}
