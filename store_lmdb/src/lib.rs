//! LMDB storage backend for microcred.
//!
//! Implements all storage traits from `microcred-store` using the `heed` LMDB
//! bindings. Each logical store maps to one or more named LMDB databases
//! within a single environment; values are `bincode`-encoded.

pub mod deposit;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod loan;
pub mod nonce;
pub mod provider;
pub mod user;

pub use environment::{LmdbEnvironment, CURRENT_SCHEMA_VERSION};
pub use error::LmdbError;
pub use provider::LazyLmdbProvider;
