//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Number of named databases opened below (plus headroom).
const MAX_DBS: u32 = 16;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Wraps the LMDB environment and all database handles.
///
/// Every store trait is implemented directly on this type, one module per
/// trait.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    /// nonce value -> NonceRecord
    pub(crate) nonces_db: Database<Bytes, Bytes>,
    /// nullifier -> UserRecord
    pub(crate) users_db: Database<Bytes, Bytes>,
    /// loan id (16 bytes) -> LoanRequest
    pub(crate) loans_db: Database<Bytes, Bytes>,
    /// nullifier ++ 0x00 ++ loan id -> ()
    pub(crate) loans_by_nullifier_db: Database<Bytes, Bytes>,
    /// reference id -> PendingDeposit
    pub(crate) deposits_db: Database<Bytes, Bytes>,
    /// owner (20 bytes) ++ timestamp (8 bytes BE) ++ entry id (16 bytes) -> LedgerEntry
    pub(crate) ledger_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// The directory is created if missing. A database written by a newer
    /// schema is refused.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by the provider and
        // the files are not modified by anything outside this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        let nonces_db = env.create_database(&mut wtxn, Some("nonces"))?;
        let users_db = env.create_database(&mut wtxn, Some("users"))?;
        let loans_db = env.create_database(&mut wtxn, Some("loans"))?;
        let loans_by_nullifier_db = env.create_database(&mut wtxn, Some("loans_by_nullifier"))?;
        let deposits_db = env.create_database(&mut wtxn, Some("pending_deposits"))?;
        let ledger_db = env.create_database(&mut wtxn, Some("ledger"))?;
        wtxn.commit()?;

        let this = Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            meta_db,
            nonces_db,
            users_db,
            loans_db,
            loans_by_nullifier_db,
            deposits_db,
            ledger_db,
        };
        this.check_schema()?;
        tracing::info!(path = %this.path.display(), "opened LMDB environment");
        Ok(this)
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored schema version, 0 for a fresh database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let version = match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) if bytes.len() == 4 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                u32::from_be_bytes(buf)
            }
            _ => 0,
        };
        Ok(version)
    }

    fn check_schema(&self) -> Result<(), LmdbError> {
        let current = self.schema_version()?;
        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if current < CURRENT_SCHEMA_VERSION {
            tracing::info!(from = current, to = CURRENT_SCHEMA_VERSION, "stamping schema version");
            let mut wtxn = self.env.write_txn()?;
            self.meta_db.put(
                &mut wtxn,
                SCHEMA_VERSION_KEY,
                &CURRENT_SCHEMA_VERSION.to_be_bytes(),
            )?;
            wtxn.commit()?;
        }
        Ok(())
    }
}
