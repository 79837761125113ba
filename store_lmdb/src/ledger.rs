//! LMDB implementation of LedgerStore.
//!
//! Key layout: `owner (20) ++ timestamp BE (8) ++ entry id (16)`. A prefix
//! scan on the owner yields that owner's entries oldest first.

use microcred_store::ledger::{LedgerEntry, LedgerStore};
use microcred_store::StoreError;
use microcred_types::WalletAddress;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

pub(crate) fn entry_key(entry: &LedgerEntry) -> [u8; 44] {
    let mut key = [0u8; 44];
    key[..20].copy_from_slice(entry.owner.as_bytes());
    key[20..28].copy_from_slice(&entry.timestamp.as_secs().to_be_bytes());
    key[28..].copy_from_slice(entry.id.as_bytes());
    key
}

impl LedgerStore for LmdbEnvironment {
    fn append_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let bytes = bincode::serialize(entry).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.ledger_db
            .put(&mut wtxn, &entry_key(entry), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn entries_for_owner(&self, owner: &WalletAddress) -> Result<Vec<LedgerEntry>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for item in self
            .ledger_db
            .prefix_iter(&rtxn, owner.as_bytes())
            .map_err(LmdbError::from)?
        {
            let (_, val) = item.map_err(LmdbError::from)?;
            entries.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::tests::temp_env;
    use microcred_store::{DepositToken, LedgerEntryKind};
    use microcred_types::Timestamp;
    use uuid::Uuid;

    fn entry(owner: u8, ts: u64) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            owner: WalletAddress::new([owner; 20]),
            kind: LedgerEntryKind::SurveyDepositConfirmed,
            description: "Survey deposit".into(),
            amount: 1.0,
            token: DepositToken::UsdcE,
            deposit_reference: format!("ref-{ts}"),
            transaction_id: format!("tx-{ts}"),
            timestamp: Timestamp::new(ts),
        }
    }

    #[test]
    fn entries_come_back_oldest_first() {
        let (_dir, env) = temp_env();
        env.append_entry(&entry(1, 300)).unwrap();
        env.append_entry(&entry(1, 100)).unwrap();
        env.append_entry(&entry(2, 200)).unwrap();
        env.append_entry(&entry(1, 200)).unwrap();
        let times: Vec<u64> = env
            .entries_for_owner(&WalletAddress::new([1; 20]))
            .unwrap()
            .iter()
            .map(|e| e.timestamp.as_secs())
            .collect();
        assert_eq!(times, vec![100, 200, 300]);
    }
}
