//! Nullable infrastructure for deterministic testing.
//!
//! The clock, the random source and the storage backend are all reached
//! through traits. This crate provides implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Swap the real implementations for these in tests.

pub mod clock;
pub mod random;
pub mod store;

pub use clock::NullClock;
pub use random::NullRandom;
pub use store::{NullProvider, NullStore};
