//! Queue gatekeeping for a single crawl invocation
//!
//! The store itself is the queue: any internal URL with a due `needs_crawl`
//! is claimable work, ordered oldest first. This module wraps that with the
//! two per-invocation rules:
//! - A hard ceiling on how many URLs one invocation may pull
//! - A lease on each pulled URL so an overlapping invocation cannot pull it
//!   again before the outcome lands

use crate::storage::{Storage, StorageResult, UrlRecord};

/// Pulls work from the store queue, enforcing the invocation ceiling
///
/// `QueueManager` is cheap, per-invocation state; the durable queue lives in
/// the store. Exhausting the ceiling and draining the queue both end the
/// pull loop, but only the former leaves the cycle open for the next
/// invocation to resume.
pub struct QueueManager {
    /// Maximum URLs this invocation may pull
    max_urls: u64,

    /// Seconds a pulled URL stays leased before it becomes due again
    lease_seconds: i64,

    /// URLs pulled so far
    taken: u64,

    /// Whether a pull was refused because the ceiling was reached
    capped: bool,
}

impl QueueManager {
    /// Creates a queue manager for one invocation
    ///
    /// # Arguments
    ///
    /// * `max_urls` - Per-invocation URL ceiling
    /// * `lease_seconds` - How long a pulled URL stays off the queue
    pub fn new(max_urls: u64, lease_seconds: i64) -> Self {
        Self {
            max_urls,
            lease_seconds,
            taken: 0,
            capped: false,
        }
    }

    /// Pulls and leases the next due URL
    ///
    /// Returns `None` when the store queue has nothing due or the invocation
    /// ceiling is reached; [`limit_reached`](QueueManager::limit_reached)
    /// distinguishes the two.
    pub fn take_next<S: Storage>(
        &mut self,
        storage: &mut S,
        now: i64,
    ) -> StorageResult<Option<UrlRecord>> {
        if self.taken >= self.max_urls {
            self.capped = true;
            return Ok(None);
        }

        let record = match storage.next_queued(now)? {
            Some(record) => record,
            None => return Ok(None),
        };

        // Lease before fetching; the outcome write sets the real schedule
        storage.claim_url(record.id, now + self.lease_seconds)?;
        self.taken += 1;

        Ok(Some(record))
    }

    /// Number of URLs pulled so far
    pub fn taken(&self) -> u64 {
        self.taken
    }

    /// True when a pull was refused because the ceiling was reached
    pub fn limit_reached(&self) -> bool {
        self.capped
    }
}
