//! Survey deposits paid through MiniKit.
//!
//! A deposit is initiated with a fresh reference id, paid by the client
//! through MiniKit, then confirmed against the developer portal's view of
//! the transaction. Confirmed deposits are written to the ledger.

use std::sync::Arc;

use microcred_crypto::{random_hex, RandomSource};
use microcred_store::{
    DepositStatus, DepositStore, DepositToken, LedgerEntry, LedgerEntryKind, PendingDeposit,
};
use microcred_types::{Clock, WalletAddress};
use microcred_worldid::MiniKitTransaction;
use uuid::Uuid;

use crate::LendingError;

/// Deposits must be strictly above this amount.
pub const MIN_DEPOSIT_EXCLUSIVE: f64 = 0.09;

const REFERENCE_BYTES: usize = 16;

pub struct DepositDesk {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl DepositDesk {
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self { clock, random }
    }

    pub fn initiate<S: DepositStore + ?Sized>(
        &self,
        store: &S,
        owner: WalletAddress,
        amount: Option<f64>,
        token_symbol: &str,
    ) -> Result<PendingDeposit, LendingError> {
        let amount = match amount {
            Some(a) if a.is_finite() && a > MIN_DEPOSIT_EXCLUSIVE => a,
            _ => {
                return Err(LendingError::validation(
                    "amount is invalid or below the minimum (0.10)",
                ))
            }
        };
        let token: DepositToken = token_symbol
            .parse()
            .map_err(|_| LendingError::validation("unsupported token"))?;

        let now = self.clock.now();
        let deposit = PendingDeposit {
            reference_id: random_hex(self.random.as_ref(), REFERENCE_BYTES),
            owner,
            requested_amount: amount,
            token,
            status: DepositStatus::Initiated,
            transaction_id: None,
            transaction_details: None,
            created_at: now,
            updated_at: now,
        };
        store.put_deposit(&deposit)?;
        tracing::info!(reference = %deposit.reference_id, %owner, amount, %token, "deposit initiated");
        Ok(deposit)
    }

    /// The caller's deposit for `reference`, if it is still `initiated`.
    pub fn find_initiated<S: DepositStore + ?Sized>(
        &self,
        store: &S,
        owner: &WalletAddress,
        reference: &str,
    ) -> Result<PendingDeposit, LendingError> {
        match store.get_deposit(reference)? {
            Some(d) if &d.owner == owner && d.status == DepositStatus::Initiated => Ok(d),
            _ => Err(LendingError::DepositNotFound),
        }
    }

    /// Apply the portal's view of the payment to an initiated deposit.
    ///
    /// A reference mismatch changes nothing. A failed or reverted payment
    /// marks the deposit `failed_on_chain`. Anything else confirms it and
    /// appends a ledger entry in the same write.
    pub fn settle<S: DepositStore + ?Sized>(
        &self,
        store: &S,
        mut deposit: PendingDeposit,
        transaction_id: &str,
        transaction: &MiniKitTransaction,
    ) -> Result<LedgerEntry, LendingError> {
        if transaction.reference.as_deref() != Some(deposit.reference_id.as_str()) {
            tracing::error!(
                expected = %deposit.reference_id,
                found = ?transaction.reference,
                "transaction reference mismatch"
            );
            return Err(LendingError::ReferenceMismatch {
                expected: deposit.reference_id,
                found: transaction.reference.clone(),
            });
        }

        let now = self.clock.now();
        deposit.transaction_id = Some(transaction_id.to_string());
        deposit.transaction_details = Some(transaction.raw.to_string());
        deposit.updated_at = now;

        if transaction.is_failed() {
            deposit.status = DepositStatus::FailedOnChain;
            store.put_deposit(&deposit)?;
            let status = transaction.status.clone().unwrap_or_default();
            tracing::warn!(reference = %deposit.reference_id, %status, "on-chain payment failed");
            return Err(LendingError::TransactionFailed(status));
        }

        deposit.status = DepositStatus::ConfirmedOnChain;
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            owner: deposit.owner,
            kind: LedgerEntryKind::SurveyDepositConfirmed,
            description: format!(
                "Survey deposit confirmed: {} {}",
                deposit.requested_amount, deposit.token
            ),
            amount: deposit.requested_amount,
            token: deposit.token,
            deposit_reference: deposit.reference_id.clone(),
            transaction_id: transaction_id.to_string(),
            timestamp: now,
        };
        store.confirm_with_entry(&deposit, &entry)?;
        tracing::info!(reference = %deposit.reference_id, "deposit confirmed");
        Ok(entry)
    }
}
