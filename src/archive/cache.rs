//! In-process checkout memo
//!
//! Maps `(commit, subdirectory)` to the archive built for it. A commit never
//! changes, so an entry never goes stale; a subdirectory that did not exist at
//! a commit is remembered as `None`.

use crate::archive::ArchiveHash;
use crate::repository::CommitId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Checkout cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckoutKey {
    commit: CommitId,
    subdirectory: String,
}

impl CheckoutKey {
    /// Key for `subdirectory` (already normalized) at `commit`
    pub fn new(commit: CommitId, subdirectory: impl Into<String>) -> Self {
        Self {
            commit,
            subdirectory: subdirectory.into(),
        }
    }
}

impl fmt::Display for CheckoutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.commit, self.subdirectory)
    }
}

/// Memo of finished checkouts plus the locks of checkouts in progress
#[derive(Debug, Default)]
pub struct CheckoutCache {
    entries: RwLock<HashMap<CheckoutKey, Option<ArchiveHash>>>,
    in_flight: Mutex<HashMap<CheckoutKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl CheckoutCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached outcome for `key`: `Some(None)` means "known to have no archive"
    pub fn get(&self, key: &CheckoutKey) -> Option<Option<ArchiveHash>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Record the outcome of a checkout
    pub fn insert(&self, key: CheckoutKey, archive: Option<ArchiveHash>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, archive);
    }

    /// Number of memoized checkouts
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been memoized yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock serializing builds of `key` within this process.
    ///
    /// Callers hold the returned mutex across the build and re-check the
    /// cache once they own it.
    pub fn build_lock(&self, key: &CheckoutKey) -> Arc<tokio::sync::Mutex<()>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Forget the build lock of `key` once its build is over.
    ///
    /// Waiters already holding the lock keep their handle and find the
    /// outcome in the cache.
    pub fn finish_build(&self, key: &CheckoutKey) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Number of builds currently holding a lock entry
    pub fn builds_in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
