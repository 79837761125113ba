//! Loan requests backed by a World ID proof.

use std::sync::Arc;

use microcred_store::{LoanRequest, LoanStatus, LoanStore, UserStore};
use microcred_types::Clock;
use microcred_worldid::VerifiedProof;
use uuid::Uuid;

use crate::directory::UserDirectory;
use crate::terms::{BASE_MAX_LOAN_AMOUNT, TIER_TWO};
use crate::LendingError;

pub const MIN_LOAN_AMOUNT: f64 = 0.5;

/// The base maximum plus the highest contribution bonus.
pub const MAX_LOAN_AMOUNT: f64 = BASE_MAX_LOAN_AMOUNT + TIER_TWO.max_loan_bonus;

pub struct LoanDesk {
    loan_action: String,
    clock: Arc<dyn Clock>,
}

impl LoanDesk {
    pub fn new(loan_action: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            loan_action: loan_action.into(),
            clock,
        }
    }

    pub fn loan_action(&self) -> &str {
        &self.loan_action
    }

    /// Checks run before the proof is sent upstream.
    pub fn validate(&self, action: &str, requested_amount: Option<f64>) -> Result<f64, LendingError> {
        if action != self.loan_action {
            return Err(LendingError::validation(format!(
                "action {action} is not the loan request action"
            )));
        }
        match requested_amount {
            Some(a) if a.is_finite() && (MIN_LOAN_AMOUNT..=MAX_LOAN_AMOUNT).contains(&a) => Ok(a),
            _ => Err(LendingError::validation(format!(
                "requestedAmount must be a number between {MIN_LOAN_AMOUNT} and {MAX_LOAN_AMOUNT}"
            ))),
        }
    }

    /// Record a `pending_approval` loan for the verified person.
    ///
    /// The person must already be in the directory.
    pub fn submit<S>(
        &self,
        store: &S,
        directory: &UserDirectory,
        proof: &VerifiedProof,
        requested_amount: f64,
    ) -> Result<LoanRequest, LendingError>
    where
        S: UserStore + LoanStore + ?Sized,
    {
        let user = directory.require_existing(store, &proof.nullifier_hash)?;
        let loan = LoanRequest {
            id: Uuid::new_v4(),
            nullifier_hash: proof.nullifier_hash.clone(),
            user_id: user.id,
            requested_amount,
            status: LoanStatus::PendingApproval,
            action: proof.action.clone(),
            verification_level: proof.verification_level,
            verification_response: proof.response.to_string(),
            created_at: self.clock.now(),
        };
        store.put_loan(&loan)?;
        tracing::info!(loan_id = %loan.id, user_id = %user.id, amount = requested_amount, "loan requested");
        Ok(loan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microcred_nullables::{NullClock, NullStore};
    use microcred_types::{NullifierHash, VerificationLevel};
    use serde_json::json;

    fn proof() -> VerifiedProof {
        VerifiedProof {
            nullifier_hash: NullifierHash::parse("0xabc").unwrap(),
            verification_level: VerificationLevel::Device,
            action: "request-loan".into(),
            response: json!({"success": true, "nullifier_hash": "0xabc"}),
        }
    }

    fn setup() -> (NullStore, UserDirectory, LoanDesk) {
        let clock = Arc::new(NullClock::new(1_000));
        (
            NullStore::new(),
            UserDirectory::new("access", clock.clone()),
            LoanDesk::new("request-loan", clock),
        )
    }

    #[test]
    fn validates_action_and_amount() {
        let (_, _, desk) = setup();
        assert_eq!(desk.validate("request-loan", Some(2.0)).unwrap(), 2.0);
        assert!(desk.validate("request-loan", Some(0.4)).is_err());
        assert!(desk.validate("request-loan", Some(7.6)).is_err());
        assert!(desk.validate("request-loan", Some(f64::NAN)).is_err());
        assert!(desk.validate("request-loan", None).is_err());
        assert!(desk.validate("access", Some(2.0)).is_err());
        assert_eq!(desk.validate("request-loan", Some(MAX_LOAN_AMOUNT)).unwrap(), 7.5);
    }

    #[test]
    fn unknown_person_gets_access_action_required() {
        let (store, dir, desk) = setup();
        assert!(matches!(
            desk.submit(&store, &dir, &proof(), 2.0),
            Err(LendingError::AccessActionRequired)
        ));
        assert_eq!(store.loan_count().unwrap(), 0);
    }

    #[test]
    fn known_person_gets_pending_loan() {
        let (store, dir, desk) = setup();
        let (user, _) = dir
            .create_if_access_action(&store, &proof().nullifier_hash, "access")
            .unwrap();
        let loan = desk.submit(&store, &dir, &proof(), 3.25).unwrap();
        assert_eq!(loan.status, LoanStatus::PendingApproval);
        assert_eq!(loan.user_id, user.id);
        assert_eq!(loan.created_at.as_secs(), 1_000);
        assert!(loan.verification_response.contains("nullifier_hash"));
        assert_eq!(store.get_loan(&loan.id).unwrap(), loan);
    }
}
