//! LMDB implementation of LoanStore.
//!
//! Loans are keyed by their UUID bytes. A secondary index keyed by
//! `nullifier ++ 0x00 ++ loan id` lists the loans of one person.

use microcred_store::loan::{LoanRequest, LoanStore};
use microcred_store::StoreError;
use microcred_types::NullifierHash;
use uuid::Uuid;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

fn index_prefix(nullifier: &NullifierHash) -> Vec<u8> {
    let mut key = nullifier.as_str().as_bytes().to_vec();
    key.push(0);
    key
}

fn index_key(nullifier: &NullifierHash, id: &Uuid) -> Vec<u8> {
    let mut key = index_prefix(nullifier);
    key.extend_from_slice(id.as_bytes());
    key
}

impl LoanStore for LmdbEnvironment {
    fn put_loan(&self, loan: &LoanRequest) -> Result<(), StoreError> {
        let bytes = bincode::serialize(loan).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.loans_db
            .put(&mut wtxn, loan.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.loans_by_nullifier_db
            .put(&mut wtxn, &index_key(&loan.nullifier_hash, &loan.id), &[])
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_loan(&self, id: &Uuid) -> Result<LoanRequest, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .loans_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("loan {id}")))?;
        Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
    }

    fn loans_for_nullifier(
        &self,
        nullifier: &NullifierHash,
    ) -> Result<Vec<LoanRequest>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let prefix = index_prefix(nullifier);
        let mut loans = Vec::new();
        for item in self
            .loans_by_nullifier_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?
        {
            let (key, _) = item.map_err(LmdbError::from)?;
            let id_bytes = &key[prefix.len()..];
            if let Some(bytes) = self.loans_db.get(&rtxn, id_bytes).map_err(LmdbError::from)? {
                loans.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
            }
        }
        Ok(loans)
    }

    fn loan_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.loans_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
