//! LMDB implementation of NonceStore.

use microcred_store::nonce::{NonceRecord, NonceStore};
use microcred_store::StoreError;
use microcred_types::Timestamp;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl NonceStore for LmdbEnvironment {
    fn put_nonce(&self, record: &NonceRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.nonces_db
            .put(&mut wtxn, record.value.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_nonce(&self, value: &str) -> Result<Option<NonceRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .nonces_db
            .get(&rtxn, value.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn take_nonce(&self, value: &str) -> Result<Option<NonceRecord>, StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        let record: Option<NonceRecord> = match self
            .nonces_db
            .get(&wtxn, value.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Some(bincode::deserialize(bytes).map_err(LmdbError::from)?),
            None => None,
        };
        if record.is_some() {
            self.nonces_db
                .delete(&mut wtxn, value.as_bytes())
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }

    fn purge_expired_nonces(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        let mut expired = Vec::new();
        for item in self.nonces_db.iter(&wtxn).map_err(LmdbError::from)? {
            let (key, val) = item.map_err(LmdbError::from)?;
            let record: NonceRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            if record.is_expired(now) {
                expired.push(key.to_vec());
            }
        }
        for key in &expired {
            self.nonces_db
                .delete(&mut wtxn, key)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(expired.len() as u64)
    }
}
