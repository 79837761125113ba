//! Append-only transaction ledger.

use crate::deposit::DepositToken;
use crate::StoreError;
use microcred_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryKind {
    SurveyDepositConfirmed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,
    pub owner: WalletAddress,
    pub kind: LedgerEntryKind,
    pub description: String,
    pub amount: f64,
    pub token: DepositToken,
    pub deposit_reference: String,
    pub transaction_id: String,
    pub timestamp: Timestamp,
}

pub trait LedgerStore {
    fn append_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Entries for one owner, oldest first.
    fn entries_for_owner(&self, owner: &WalletAddress) -> Result<Vec<LedgerEntry>, StoreError>;
}
