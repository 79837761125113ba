//! Users keyed by World ID nullifier hash.

use std::sync::Arc;

use microcred_store::{StoreError, UserRecord, UserStore};
use microcred_types::{Clock, NullifierHash};

use crate::LendingError;

pub struct UserDirectory {
    access_action: String,
    clock: Arc<dyn Clock>,
}

impl UserDirectory {
    pub fn new(access_action: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            access_action: access_action.into(),
            clock,
        }
    }

    pub fn access_action(&self) -> &str {
        &self.access_action
    }

    pub fn find_by_nullifier<S: UserStore + ?Sized>(
        &self,
        store: &S,
        nullifier: &NullifierHash,
    ) -> Result<Option<UserRecord>, LendingError> {
        Ok(store.get_user(nullifier)?)
    }

    /// Touch the existing user, or create one when `action` is the
    /// general-access action.
    ///
    /// Returns the record and whether it was created by this call.
    pub fn create_if_access_action<S: UserStore + ?Sized>(
        &self,
        store: &S,
        nullifier: &NullifierHash,
        action: &str,
    ) -> Result<(UserRecord, bool), LendingError> {
        let now = self.clock.now();
        if let Some(user) = store.touch_user(nullifier, now)? {
            return Ok((user, false));
        }
        if action != self.access_action {
            tracing::info!(action, "unknown user attempted a gated action");
            return Err(LendingError::AccessActionRequired);
        }

        let user = UserRecord::new(nullifier.clone(), now);
        match store.insert_user(&user) {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "created user");
                Ok((user, true))
            }
            Err(StoreError::Duplicate(_)) => {
                // A concurrent request inserted first.
                let winner = store
                    .touch_user(nullifier, now)?
                    .ok_or_else(|| StoreError::NotFound(nullifier.to_string()))?;
                Ok((winner, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Touch and return an existing user; unknown nullifiers fail.
    pub fn require_existing<S: UserStore + ?Sized>(
        &self,
        store: &S,
        nullifier: &NullifierHash,
    ) -> Result<UserRecord, LendingError> {
        store
            .touch_user(nullifier, self.clock.now())?
            .ok_or(LendingError::AccessActionRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microcred_nullables::{NullClock, NullStore};
    use microcred_store::Balances;

    fn nullifier() -> NullifierHash {
        NullifierHash::parse("0x2bf8406809dcefb1486dadc96c0a897db9bab002053054cf64272db512c6fbd8")
            .unwrap()
    }

    fn directory(clock: Arc<NullClock>) -> UserDirectory {
        UserDirectory::new("access", clock)
    }

    #[test]
    fn first_access_creates_opening_balances() {
        let store = NullStore::new();
        let dir = directory(Arc::new(NullClock::new(10)));
        let (user, created) = dir.create_if_access_action(&store, &nullifier(), "access").unwrap();
        assert!(created);
        assert_eq!(user.balances, Balances::opening());
        assert_eq!(user.balances.current_flexible_interest_rate, 0.01);
        assert_eq!(store.user_count().unwrap(), 1);
    }

    #[test]
    fn later_verifications_only_touch() {
        let clock = Arc::new(NullClock::new(10));
        let store = NullStore::new();
        let dir = directory(clock.clone());
        let (first, _) = dir.create_if_access_action(&store, &nullifier(), "access").unwrap();
        clock.advance(50);
        let (again, created) = dir
            .create_if_access_action(&store, &nullifier(), "request-loan")
            .unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(again.created_at, first.created_at);
        assert_eq!(again.updated_at.as_secs(), 60);
        assert_eq!(store.user_count().unwrap(), 1);
    }

    #[test]
    fn gated_action_for_unknown_user_creates_nothing() {
        let store = NullStore::new();
        let dir = directory(Arc::new(NullClock::new(0)));
        assert!(matches!(
            dir.create_if_access_action(&store, &nullifier(), "request-loan"),
            Err(LendingError::AccessActionRequired)
        ));
        assert!(matches!(
            dir.require_existing(&store, &nullifier()),
            Err(LendingError::AccessActionRequired)
        ));
        assert_eq!(store.user_count().unwrap(), 0);
        assert!(dir.find_by_nullifier(&store, &nullifier()).unwrap().is_none());
    }
}
