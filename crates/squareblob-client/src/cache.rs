//! Time-boxed cache for account info and the object list
//!
//! Expiry is single-shot and checked lazily: the first population arms a
//! deadline, later populations leave it alone, and the first access after
//! the deadline clears everything. The next population arms a new deadline.

use crate::{AccountInfo, Logger, StoredObject};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct CacheState {
    account: Option<AccountInfo>,
    objects: Option<Vec<StoredObject>>,
    expires_at: Option<Instant>,
}

impl CacheState {
    fn arm(&mut self, ttl: Duration) {
        if self.expires_at.is_none() {
            self.expires_at = Some(Instant::now() + ttl);
        }
    }

    fn clear(&mut self) {
        self.account = None;
        self.objects = None;
        self.expires_at = None;
    }
}

/// Process-local cache shared by one client
#[derive(Debug)]
pub struct Cache {
    ttl: Duration,
    state: Mutex<CacheState>,
    log: Logger,
}

impl Cache {
    /// Create an empty cache whose entries live for `ttl` after first population
    pub fn new(ttl: Duration, log: Logger) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
            log,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached account info, `None` on a miss
    pub fn account(&self) -> Option<AccountInfo> {
        let mut state = self.state.lock();
        self.expire_if_due(&mut state);
        state.account.clone()
    }

    /// Cached object list, `None` on a miss
    pub fn objects(&self) -> Option<Vec<StoredObject>> {
        let mut state = self.state.lock();
        self.expire_if_due(&mut state);
        state.objects.clone()
    }

    pub fn set_account(&self, account: AccountInfo) {
        let mut state = self.state.lock();
        self.expire_if_due(&mut state);
        state.account = Some(account);
        state.arm(self.ttl);
    }

    /// Replace the object list
    pub fn set_objects(&self, objects: Vec<StoredObject>) {
        let mut state = self.state.lock();
        self.expire_if_due(&mut state);
        state.objects = Some(objects);
        state.arm(self.ttl);
    }

    /// Drop cached objects whose id is in `ids`; returns how many were removed.
    ///
    /// Does nothing while the list is not populated.
    pub fn remove_objects<I, S>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock();
        self.expire_if_due(&mut state);
        let Some(objects) = state.objects.as_mut() else {
            return 0;
        };
        let ids: HashSet<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let before = objects.len();
        objects.retain(|obj| !ids.contains(obj.id()));
        before - objects.len()
    }

    /// Clear everything and disarm the deadline
    pub fn clear(&self) {
        self.state.lock().clear();
    }

    /// Pending expiry deadline, if armed
    pub fn expires_at(&self) -> Option<Instant> {
        let mut state = self.state.lock();
        self.expire_if_due(&mut state);
        state.expires_at
    }

    fn expire_if_due(&self, state: &mut CacheState) {
        if let Some(deadline) = state.expires_at {
            if Instant::now() >= deadline {
                self.log.info("Clearing all cached info...");
                state.clear();
            }
        }
    }
}
