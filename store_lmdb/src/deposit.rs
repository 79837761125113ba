//! LMDB implementation of DepositStore.

use microcred_store::deposit::{DepositStore, PendingDeposit};
use microcred_store::ledger::LedgerEntry;
use microcred_store::StoreError;
use microcred_types::WalletAddress;

use crate::environment::LmdbEnvironment;
use crate::ledger::entry_key;
use crate::LmdbError;

impl DepositStore for LmdbEnvironment {
    fn put_deposit(&self, deposit: &PendingDeposit) -> Result<(), StoreError> {
        let bytes = bincode::serialize(deposit).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.deposits_db
            .put(&mut wtxn, deposit.reference_id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_deposit(&self, reference_id: &str) -> Result<Option<PendingDeposit>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .deposits_db
            .get(&rtxn, reference_id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn deposits_for_owner(&self, owner: &WalletAddress) -> Result<Vec<PendingDeposit>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut deposits = Vec::new();
        for item in self.deposits_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, val) = item.map_err(LmdbError::from)?;
            let deposit: PendingDeposit = bincode::deserialize(val).map_err(LmdbError::from)?;
            if &deposit.owner == owner {
                deposits.push(deposit);
            }
        }
        Ok(deposits)
    }

    fn confirm_with_entry(
        &self,
        deposit: &PendingDeposit,
        entry: &LedgerEntry,
    ) -> Result<(), StoreError> {
        let deposit_bytes = bincode::serialize(deposit).map_err(LmdbError::from)?;
        let entry_bytes = bincode::serialize(entry).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.deposits_db
            .put(&mut wtxn, deposit.reference_id.as_bytes(), &deposit_bytes)
            .map_err(LmdbError::from)?;
        self.ledger_db
            .put(&mut wtxn, &entry_key(entry), &entry_bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
