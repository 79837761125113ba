//! User record storage, keyed by World ID nullifier hash.

use crate::StoreError;
use microcred_types::{NullifierHash, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Interest rate every new flexible-savings balance starts with.
pub const INITIAL_FLEXIBLE_INTEREST_RATE: f64 = 0.01;

/// Simulated balances held for a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    pub wld: f64,
    pub usdc: f64,
    pub flexible_savings: f64,
    pub current_flexible_interest_rate: f64,
}

impl Balances {
    /// Zeroed balances at the initial interest rate.
    pub fn opening() -> Self {
        Self {
            wld: 0.0,
            usdc: 0.0,
            flexible_savings: 0.0,
            current_flexible_interest_rate: INITIAL_FLEXIBLE_INTEREST_RATE,
        }
    }
}

/// An application user. Exactly one exists per nullifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub world_id_nullifier_hash: NullifierHash,
    pub balances: Balances,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserRecord {
    pub fn new(nullifier: NullifierHash, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            world_id_nullifier_hash: nullifier,
            balances: Balances::opening(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Trait for user storage operations.
pub trait UserStore {
    fn get_user(&self, nullifier: &NullifierHash) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new user. Fails with [`StoreError::Duplicate`] if a record
    /// for the nullifier already exists; the check and the write happen in
    /// one transaction.
    fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError>;

    /// Set `updated_at` on an existing user and return the updated record,
    /// or `None` if there is no such user.
    fn touch_user(
        &self,
        nullifier: &NullifierHash,
        now: Timestamp,
    ) -> Result<Option<UserRecord>, StoreError>;

    fn user_count(&self) -> Result<u64, StoreError>;
}
