//! Abstract storage traits for microcred.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod deposit;
pub mod error;
pub mod ledger;
pub mod loan;
pub mod nonce;
pub mod provider;
pub mod user;

pub use deposit::{DepositStatus, DepositStore, DepositToken, PendingDeposit};
pub use error::StoreError;
pub use ledger::{LedgerEntry, LedgerEntryKind, LedgerStore};
pub use loan::{LoanRequest, LoanStatus, LoanStore};
pub use nonce::{NonceRecord, NonceStore};
pub use provider::{Backend, StoreProvider};
pub use user::{Balances, UserRecord, UserStore};
