//! Pending survey deposits.
//!
//! A deposit is initiated before the client pays through MiniKit, then
//! confirmed (or failed) once the payment's transaction has been looked up.

use crate::ledger::LedgerEntry;
use crate::StoreError;
use microcred_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositToken {
    #[serde(rename = "WLD")]
    Wld,
    #[serde(rename = "USDC.e")]
    UsdcE,
}

impl DepositToken {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Wld => "WLD",
            Self::UsdcE => "USDC.e",
        }
    }
}

impl fmt::Display for DepositToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for DepositToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WLD" => Ok(Self::Wld),
            "USDC.e" => Ok(Self::UsdcE),
            other => Err(format!("unsupported token: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Initiated,
    ConfirmedOnChain,
    FailedOnChain,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDeposit {
    pub reference_id: String,
    pub owner: WalletAddress,
    pub requested_amount: f64,
    pub token: DepositToken,
    pub status: DepositStatus,
    pub transaction_id: Option<String>,
    /// Upstream transaction JSON recorded at confirmation time.
    pub transaction_details: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Trait for deposit storage. Keys are reference ids.
pub trait DepositStore {
    /// Insert or overwrite a deposit.
    fn put_deposit(&self, deposit: &PendingDeposit) -> Result<(), StoreError>;

    fn get_deposit(&self, reference_id: &str) -> Result<Option<PendingDeposit>, StoreError>;

    fn deposits_for_owner(&self, owner: &WalletAddress) -> Result<Vec<PendingDeposit>, StoreError>;

    /// Overwrite a confirmed deposit and append its ledger entry in one
    /// write. Either both records land or neither does.
    fn confirm_with_entry(
        &self,
        deposit: &PendingDeposit,
        entry: &LedgerEntry,
    ) -> Result<(), StoreError>;
}
