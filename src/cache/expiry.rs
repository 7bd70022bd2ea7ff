//! Expiry Scheduler Module
//!
//! Tracks per-entry expiry deadlines in a min-heap with cancellable handles.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tokio::time::Instant;

/// Stale heap slots tolerated before the queue is rebuilt.
const COMPACT_SLACK: usize = 64;

// == Expiry Handle ==
/// Identifies one armed expiry. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpiryHandle(u64);

// == Expiry Scheduler ==
/// Deadline queue for a single region.
///
/// Cancelling only drops the handle from the live map; the matching heap
/// slot is discarded when it reaches the top. A handle leaves the live map
/// exactly once, through either `cancel` or `pop_due`, so a key is never
/// reported twice for one schedule.
#[derive(Debug, Default, Clone)]
pub struct ExpiryScheduler {
    queue: BinaryHeap<Reverse<(Instant, ExpiryHandle)>>,
    live: HashMap<ExpiryHandle, String>,
    next_id: u64,
}

impl ExpiryScheduler {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Schedule ==
    /// Arms a removal of `key` at `deadline`.
    pub fn schedule(&mut self, key: &str, deadline: Instant) -> ExpiryHandle {
        let handle = ExpiryHandle(self.next_id);
        self.next_id += 1;
        self.queue.push(Reverse((deadline, handle)));
        self.live.insert(handle, key.to_string());
        handle
    }

    // == Cancel ==
    /// Disarms a pending removal.
    ///
    /// Returns false if the handle already fired or was cancelled.
    pub fn cancel(&mut self, handle: ExpiryHandle) -> bool {
        let cancelled = self.live.remove(&handle).is_some();
        if cancelled {
            self.maybe_compact();
        }
        cancelled
    }

    // == Pop Due ==
    /// Removes and returns every armed `(handle, key)` whose deadline is at
    /// or before `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<(ExpiryHandle, String)> {
        let mut due = Vec::new();
        while let Some(Reverse((deadline, handle))) = self.queue.peek().copied() {
            if deadline > now {
                break;
            }
            self.queue.pop();
            if let Some(key) = self.live.remove(&handle) {
                due.push((handle, key));
            }
        }
        due
    }

    // == Next Deadline ==
    /// Earliest armed deadline, discarding cancelled slots on the way.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse((deadline, handle))) = self.queue.peek().copied() {
            if self.live.contains_key(&handle) {
                return Some(deadline);
            }
            self.queue.pop();
        }
        None
    }

    // == Length ==
    /// Number of armed expiries.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn maybe_compact(&mut self) {
        if self.queue.len() > 2 * self.live.len() + COMPACT_SLACK {
            let live = &self.live;
            self.queue.retain(|Reverse((_, handle))| live.contains_key(handle));
        }
    }
}
