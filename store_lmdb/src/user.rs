//! LMDB implementation of UserStore.

use microcred_store::user::{UserRecord, UserStore};
use microcred_store::StoreError;
use microcred_types::{NullifierHash, Timestamp};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl UserStore for LmdbEnvironment {
    fn get_user(&self, nullifier: &NullifierHash) -> Result<Option<UserRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .users_db
            .get(&rtxn, nullifier.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let key = user.world_id_nullifier_hash.as_str().as_bytes();
        let bytes = bincode::serialize(user).map_err(LmdbError::from)?;
        // LMDB allows one writer at a time, so the existence check below
        // cannot interleave with another insert.
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        if self
            .users_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(user.world_id_nullifier_hash.to_string()));
        }
        self.users_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn touch_user(
        &self,
        nullifier: &NullifierHash,
        now: Timestamp,
    ) -> Result<Option<UserRecord>, StoreError> {
        let key = nullifier.as_str().as_bytes();
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        let mut user: UserRecord = match self.users_db.get(&wtxn, key).map_err(LmdbError::from)? {
            Some(bytes) => bincode::deserialize(bytes).map_err(LmdbError::from)?,
            None => return Ok(None),
        };
        user.updated_at = now;
        let bytes = bincode::serialize(&user).map_err(LmdbError::from)?;
        self.users_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(Some(user))
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let count = self.users_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
