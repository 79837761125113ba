//! Server-side login nonce storage.

use crate::StoreError;
use microcred_types::Timestamp;
use serde::{Deserialize, Serialize};

/// A nonce issued for one login attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    pub value: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl NonceRecord {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Trait for nonce storage. Keys are the nonce values themselves.
pub trait NonceStore {
    fn put_nonce(&self, record: &NonceRecord) -> Result<(), StoreError>;

    fn get_nonce(&self, value: &str) -> Result<Option<NonceRecord>, StoreError>;

    /// Remove and return a nonce in a single write, so two concurrent
    /// consumers cannot both observe it.
    fn take_nonce(&self, value: &str) -> Result<Option<NonceRecord>, StoreError>;

    /// Delete every nonce whose expiry is at or before `now`. Returns the
    /// number removed.
    fn purge_expired_nonces(&self, now: Timestamp) -> Result<u64, StoreError>;
}
