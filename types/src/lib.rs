//! Fundamental types for the microcred service.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! wallet addresses, World ID nullifier hashes, verification levels and timestamps.

pub mod address;
pub mod error;
pub mod identity;
pub mod nullifier;
pub mod time;

pub use address::WalletAddress;
pub use error::TypesError;
pub use identity::VerificationLevel;
pub use nullifier::NullifierHash;
pub use time::{Clock, SystemClock, Timestamp};
