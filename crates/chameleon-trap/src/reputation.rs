//! Per-client suspicion scoring.
//!
//! Every hit on an unmapped path raises the client's suspicion score
//! by one. Scores never decrease and never decay; the ledger is keyed
//! by raw client address, which conflates clients behind shared NAT.
//! Both properties are inherited deliberately; `last_seen` is recorded
//! so a decay window could be added later without a schema change.
//!
//! ## Concurrency
//!
//! The ledger is write-heavy (every miss mutates) and read-light (the
//! dashboard polls occasionally). Updates go through one mutex with a
//! critical section of a single map operation. The request path uses a
//! non-blocking acquire: if the lock cannot be taken immediately the
//! update is skipped so the response is never delayed by scoring.

use std::collections::HashMap;
use std::sync::{Mutex, TryLockError};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrapError};

/// Suspicion record for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationEntry {
    /// Number of stale-route hits observed. Never decreases.
    pub suspicion_score: u64,

    /// Instant of the most recent stale-route hit.
    pub last_seen: SystemTime,
}

/// Shared suspicion ledger keyed by client address.
#[derive(Debug, Default)]
pub struct ReputationLedger {
    entries: Mutex<HashMap<String, ReputationEntry>>,
}

impl ReputationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one stale-route hit and returns the prior score.
    ///
    /// Non-blocking: if the store cannot be acquired immediately the
    /// update is skipped and [`TrapError::ReputationUnavailable`] is
    /// returned. Callers must treat that as "score unknown, respond
    /// anyway".
    ///
    /// A poisoned lock is recovered rather than treated as fatal; the
    /// ledger holds plain counters and every state is valid.
    pub fn record_miss(&self, client_key: &str) -> Result<u64> {
        let mut entries = match self.entries.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(TrapError::ReputationUnavailable),
        };

        let entry = entries
            .entry(client_key.to_string())
            .or_insert(ReputationEntry {
                suspicion_score: 0,
                last_seen: SystemTime::now(),
            });
        let prior = entry.suspicion_score;
        entry.suspicion_score += 1;
        entry.last_seen = SystemTime::now();
        Ok(prior)
    }

    /// Current score for a client (0 if never seen).
    #[must_use]
    pub fn score_of(&self, client_key: &str) -> u64 {
        self.lock_entries()
            .get(client_key)
            .map_or(0, |e| e.suspicion_score)
    }

    /// Number of clients with at least one recorded miss.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Returns true if no client has been scored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// Read-only snapshot for the dashboard, sorted by score descending.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, ReputationEntry)> {
        let mut all: Vec<_> = self
            .lock_entries()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        all.sort_by(|a, b| b.1.suspicion_score.cmp(&a.1.suspicion_score));
        all
    }

    /// Blocking acquire with poison recovery, for read paths.
    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, ReputationEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
