//! Nullable store: thread-safe in-memory storage for testing.

use microcred_store::{
    Backend, DepositStore, LedgerEntry, LedgerStore, LoanRequest, LoanStore, NonceRecord,
    NonceStore, PendingDeposit, StoreError, StoreProvider, UserRecord, UserStore,
};
use microcred_types::{NullifierHash, Timestamp, WalletAddress};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// An in-memory implementation of every store trait.
///
/// `fail_writes` makes every mutating call return a backend error, which is
/// how tests drive the handle invalidation path. `fail_ledger` fails only
/// writes that touch the ledger.
#[derive(Default)]
pub struct NullStore {
    nonces: Mutex<HashMap<String, NonceRecord>>,
    users: Mutex<HashMap<String, UserRecord>>,
    loans: Mutex<Vec<LoanRequest>>,
    deposits: Mutex<HashMap<String, PendingDeposit>>,
    ledger: Mutex<Vec<LedgerEntry>>,
    fail_writes: AtomicBool,
    fail_ledger: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_ledger(&self, fail: bool) {
        self.fail_ledger.store(fail, Ordering::SeqCst);
    }

    pub fn nonce_count(&self) -> usize {
        self.nonces.lock().unwrap().len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        Ok(())
    }

    fn check_ledger_writable(&self) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.fail_ledger.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("ledger writes disabled".into()));
        }
        Ok(())
    }
}

impl NonceStore for NullStore {
    fn put_nonce(&self, record: &NonceRecord) -> Result<(), StoreError> {
        self.check_writable()?;
        self.nonces
            .lock()
            .unwrap()
            .insert(record.value.clone(), record.clone());
        Ok(())
    }

    fn get_nonce(&self, value: &str) -> Result<Option<NonceRecord>, StoreError> {
        Ok(self.nonces.lock().unwrap().get(value).cloned())
    }

    fn take_nonce(&self, value: &str) -> Result<Option<NonceRecord>, StoreError> {
        self.check_writable()?;
        Ok(self.nonces.lock().unwrap().remove(value))
    }

    fn purge_expired_nonces(&self, now: Timestamp) -> Result<u64, StoreError> {
        self.check_writable()?;
        let mut nonces = self.nonces.lock().unwrap();
        let before = nonces.len();
        nonces.retain(|_, r| !r.is_expired(now));
        Ok((before - nonces.len()) as u64)
    }
}

impl UserStore for NullStore {
    fn get_user(&self, nullifier: &NullifierHash) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.lock().unwrap().get(nullifier.as_str()).cloned())
    }

    fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut users = self.users.lock().unwrap();
        let key = user.world_id_nullifier_hash.as_str();
        if users.contains_key(key) {
            return Err(StoreError::Duplicate(key.to_string()));
        }
        users.insert(key.to_string(), user.clone());
        Ok(())
    }

    fn touch_user(
        &self,
        nullifier: &NullifierHash,
        now: Timestamp,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.check_writable()?;
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(nullifier.as_str()).map(|u| {
            u.updated_at = now;
            u.clone()
        }))
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        Ok(self.users.lock().unwrap().len() as u64)
    }
}

impl LoanStore for NullStore {
    fn put_loan(&self, loan: &LoanRequest) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut loans = self.loans.lock().unwrap();
        loans.retain(|l| l.id != loan.id);
        loans.push(loan.clone());
        Ok(())
    }

    fn get_loan(&self, id: &Uuid) -> Result<LoanRequest, StoreError> {
        self.loans
            .lock()
            .unwrap()
            .iter()
            .find(|l| &l.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("loan {id}")))
    }

    fn loans_for_nullifier(
        &self,
        nullifier: &NullifierHash,
    ) -> Result<Vec<LoanRequest>, StoreError> {
        Ok(self
            .loans
            .lock()
            .unwrap()
            .iter()
            .filter(|l| &l.nullifier_hash == nullifier)
            .cloned()
            .collect())
    }

    fn loan_count(&self) -> Result<u64, StoreError> {
        Ok(self.loans.lock().unwrap().len() as u64)
    }
}

impl DepositStore for NullStore {
    fn put_deposit(&self, deposit: &PendingDeposit) -> Result<(), StoreError> {
        self.check_writable()?;
        self.deposits
            .lock()
            .unwrap()
            .insert(deposit.reference_id.clone(), deposit.clone());
        Ok(())
    }

    fn get_deposit(&self, reference_id: &str) -> Result<Option<PendingDeposit>, StoreError> {
        Ok(self.deposits.lock().unwrap().get(reference_id).cloned())
    }

    fn deposits_for_owner(&self, owner: &WalletAddress) -> Result<Vec<PendingDeposit>, StoreError> {
        Ok(self
            .deposits
            .lock()
            .unwrap()
            .values()
            .filter(|d| &d.owner == owner)
            .cloned()
            .collect())
    }

    fn confirm_with_entry(
        &self,
        deposit: &PendingDeposit,
        entry: &LedgerEntry,
    ) -> Result<(), StoreError> {
        self.check_ledger_writable()?;
        let mut deposits = self.deposits.lock().unwrap();
        let mut ledger = self.ledger.lock().unwrap();
        deposits.insert(deposit.reference_id.clone(), deposit.clone());
        ledger.push(entry.clone());
        Ok(())
    }
}

impl LedgerStore for NullStore {
    fn append_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.check_ledger_writable()?;
        self.ledger.lock().unwrap().push(entry.clone());
        Ok(())
    }

    fn entries_for_owner(&self, owner: &WalletAddress) -> Result<Vec<LedgerEntry>, StoreError> {
        let mut entries: Vec<LedgerEntry> = self
            .ledger
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.owner == owner)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }
}

/// Hands out one shared [`NullStore`].
///
/// `set_available(false)` simulates a database that cannot be reached.
/// Every `invalidate()` call is counted.
pub struct NullProvider {
    store: Arc<NullStore>,
    available: AtomicBool,
    invalidations: AtomicUsize,
}

impl NullProvider {
    pub fn new() -> Self {
        Self::with_store(Arc::new(NullStore::new()))
    }

    pub fn with_store(store: Arc<NullStore>) -> Self {
        Self {
            store,
            available: AtomicBool::new(true),
            invalidations: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &Arc<NullStore> {
        &self.store
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreProvider for NullProvider {
    fn backend(&self) -> Result<Arc<dyn Backend>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("null provider offline".into()));
        }
        Ok(Arc::clone(&self.store) as Arc<dyn Backend>)
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}
