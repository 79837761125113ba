//! Shared state handed to every handler.

use std::sync::Arc;

use microcred_auth::{NonceError, NonceService, SessionIssuer};
use microcred_crypto::RandomSource;
use microcred_lending::{DepositDesk, LendingError, LoanDesk, UserDirectory};
use microcred_store::{Backend, StoreError, StoreProvider};
use microcred_types::{Clock, Timestamp};
use microcred_worldid::WorldIdClient;

use crate::{ApiConfig, ApiError, ApiMetrics, ServerError};

pub struct AppState {
    pub config: ApiConfig,
    pub nonces: NonceService,
    pub sessions: SessionIssuer,
    pub world_id: WorldIdClient,
    pub directory: UserDirectory,
    pub loans: LoanDesk,
    pub deposits: DepositDesk,
    pub metrics: ApiMetrics,
    provider: Arc<dyn StoreProvider>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Validate `config` and build every service from it.
    ///
    /// Without a session secret (development only) a random one is
    /// generated, so sessions do not survive a restart.
    pub fn new(
        config: ApiConfig,
        provider: Arc<dyn StoreProvider>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let secure = config.secure_cookies();

        let sessions = match config.session_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => SessionIssuer::new(secret.as_bytes().to_vec(), secure)?,
            None => {
                tracing::warn!("no session secret configured; using an ephemeral one");
                SessionIssuer::ephemeral(random.as_ref(), secure)
            }
        };

        Ok(Self {
            nonces: NonceService::new(config.nonce_ttl_secs, secure, clock.clone(), random.clone()),
            sessions,
            world_id: WorldIdClient::new(config.world_id())?,
            directory: UserDirectory::new(config.access_action.clone(), clock.clone()),
            loans: LoanDesk::new(config.loan_action.clone(), clock.clone()),
            deposits: DepositDesk::new(clock.clone(), random),
            metrics: ApiMetrics::new()?,
            config,
            provider,
            clock,
        })
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn backend(&self) -> Result<Arc<dyn Backend>, ApiError> {
        self.provider.backend().map_err(|e| self.store_failure(e))
    }

    /// Map a store error to a 500, dropping the cached backend when the
    /// backend itself failed.
    pub fn store_failure(&self, e: StoreError) -> ApiError {
        if matches!(e, StoreError::Backend(_)) {
            self.provider.invalidate();
        }
        ApiError::internal(e)
    }

    pub fn lending_failure(&self, e: LendingError) -> ApiError {
        match e {
            LendingError::Store(e) => self.store_failure(e),
            other => other.into(),
        }
    }

    pub fn nonce_failure(&self, e: NonceError) -> ApiError {
        match e {
            NonceError::Store(e) => self.store_failure(e),
            other => other.into(),
        }
    }
}
