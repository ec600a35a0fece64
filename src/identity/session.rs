//! Session epoch for discarding stale in-flight work
//!
//! When a visitor logs out mid-flight, registry fetches started under the old
//! session must be discarded silently on completion rather than applied to
//! client state. Callers snapshot the epoch before starting a fetch and check
//! it is still current before applying the result.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic session generation counter
#[derive(Debug, Default)]
pub struct SessionEpoch {
    generation: AtomicU64,
}

impl SessionEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current generation before starting async work
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Advance the generation; outstanding snapshots become stale
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// True iff a result obtained under `snapshot` may still be applied
    pub fn accepts(&self, snapshot: u64) -> bool {
        self.current() == snapshot
    }
}
