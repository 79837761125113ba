//! Loan request storage.

use crate::StoreError;
use microcred_types::{NullifierHash, Timestamp, VerificationLevel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a loan request. Requests are created pending and no
/// approval workflow moves them on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    PendingApproval,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub id: Uuid,
    pub nullifier_hash: NullifierHash,
    pub user_id: Uuid,
    pub requested_amount: f64,
    pub status: LoanStatus,
    pub action: String,
    pub verification_level: VerificationLevel,
    /// The verification service's response body, kept verbatim for audit.
    pub verification_response: String,
    pub created_at: Timestamp,
}

/// Trait for loan request storage.
pub trait LoanStore {
    fn put_loan(&self, loan: &LoanRequest) -> Result<(), StoreError>;

    fn get_loan(&self, id: &Uuid) -> Result<LoanRequest, StoreError>;

    fn loans_for_nullifier(&self, nullifier: &NullifierHash)
        -> Result<Vec<LoanRequest>, StoreError>;

    fn loan_count(&self) -> Result<u64, StoreError>;
}
