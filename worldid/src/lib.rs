//! Client for the World ID developer portal.
//!
//! - [`WorldIdClient::verify_proof`] posts a zero-knowledge proof to
//!   `/api/v2/verify/{app_id}` and interprets the answer.
//! - [`WorldIdClient::lookup_transaction`] fetches a MiniKit payment from
//!   `/api/v2/minikit/transaction/{id}`.

pub mod client;
pub mod error;
pub mod proof;
pub mod transaction;

pub use client::{WorldIdClient, WorldIdConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::WorldIdError;
pub use proof::{signal_hash, ProofPayload, VerificationRequest, VerifiedProof};
pub use transaction::MiniKitTransaction;
