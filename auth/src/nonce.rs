//! Server-side SIWE nonces.
//!
//! The nonce record lives in the store with an explicit expiry. The client
//! only holds the value in the `siwe_nonce` cookie, so a replayed cookie is
//! useless once the record has been taken.

use std::sync::Arc;

use microcred_crypto::{random_hex, RandomSource};
use microcred_store::{NonceRecord, NonceStore};
use microcred_types::Clock;

use crate::cookie::{SetCookie, NONCE_COOKIE};
use crate::NonceError;

/// Random bytes per nonce (hex encoded to twice as many characters).
pub const NONCE_BYTES: usize = 16;

pub const DEFAULT_NONCE_TTL_SECS: u64 = 600;

pub struct NonceService {
    ttl_secs: u64,
    secure_cookies: bool,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl NonceService {
    pub fn new(
        ttl_secs: u64,
        secure_cookies: bool,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            ttl_secs,
            secure_cookies,
            clock,
            random,
        }
    }

    /// Persist a fresh nonce and return it with the cookie naming it.
    ///
    /// Expired records are purged first.
    pub fn issue<S: NonceStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<(NonceRecord, SetCookie), NonceError> {
        let now = self.clock.now();
        let purged = store.purge_expired_nonces(now)?;
        if purged > 0 {
            tracing::debug!(purged, "purged expired nonces");
        }

        let record = NonceRecord {
            value: random_hex(self.random.as_ref(), NONCE_BYTES),
            issued_at: now,
            expires_at: now.plus_secs(self.ttl_secs),
        };
        store.put_nonce(&record)?;
        let cookie = SetCookie::new(NONCE_COOKIE, record.value.clone(), self.secure_cookies);
        Ok((record, cookie))
    }

    /// Check `candidate` against the nonce named by the cookie and delete
    /// the record on a match.
    ///
    /// A mismatch leaves the record in place. An expired record is deleted
    /// and reported the same as a missing one.
    pub fn consume<S: NonceStore + ?Sized>(
        &self,
        store: &S,
        cookie_value: Option<&str>,
        candidate: &str,
    ) -> Result<(), NonceError> {
        let value = cookie_value.ok_or(NonceError::ExpiredOrMissing)?;
        let record = store
            .get_nonce(value)?
            .ok_or(NonceError::ExpiredOrMissing)?;

        if record.is_expired(self.clock.now()) {
            store.take_nonce(value)?;
            return Err(NonceError::ExpiredOrMissing);
        }
        if record.value != candidate {
            return Err(NonceError::Mismatch);
        }
        // Lost a race with a concurrent consume of the same nonce.
        if store.take_nonce(value)?.is_none() {
            return Err(NonceError::ExpiredOrMissing);
        }
        Ok(())
    }

    /// The cookie that clears `siwe_nonce` on the client.
    pub fn clear_cookie(&self) -> SetCookie {
        SetCookie::removal(NONCE_COOKIE, self.secure_cookies)
    }
}
