//! Lending domain logic for microcred.
//!
//! Everything here is synchronous and storage-agnostic: functions take the
//! store traits they need, so the API layer decides which backend serves a
//! request and tests run against the in-memory nullable store.

pub mod deposits;
pub mod directory;
pub mod error;
pub mod exchange;
pub mod loans;
pub mod terms;

pub use deposits::{DepositDesk, MIN_DEPOSIT_EXCLUSIVE};
pub use directory::UserDirectory;
pub use error::LendingError;
pub use exchange::{simulate_exchange, ExchangeQuote, EXCHANGE_FEE_PERCENT, WLD_TO_USDC_RATE};
pub use loans::{LoanDesk, MAX_LOAN_AMOUNT, MIN_LOAN_AMOUNT};
pub use terms::{quote, LoanQuote, LoanTerm};
