//! Access to a storage backend whose lifetime is managed explicitly.

use std::sync::Arc;

use crate::{DepositStore, LedgerStore, LoanStore, NonceStore, StoreError, UserStore};

/// Every store the service needs, behind one object.
pub trait Backend:
    NonceStore + UserStore + LoanStore + DepositStore + LedgerStore + Send + Sync
{
}

impl<T> Backend for T where
    T: NonceStore + UserStore + LoanStore + DepositStore + LedgerStore + Send + Sync
{
}

/// Hands out the current backend.
///
/// Implementations may open the backend lazily on first use and reopen it
/// after [`StoreProvider::invalidate`].
pub trait StoreProvider: Send + Sync {
    fn backend(&self) -> Result<Arc<dyn Backend>, StoreError>;

    /// Drop the cached backend so the next call reopens it.
    fn invalidate(&self) {}
}
