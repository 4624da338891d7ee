//! Reconciliation of streamed optimizer results.
//!
//! The optimizer pushes "current best path" snapshots tagged with its
//! iteration counter. Delivery may reorder, duplicate or replay snapshots
//! (retries, reconnects), so the displayed state follows the iteration
//! counter instead of arrival order: it only ever moves forward until it is
//! explicitly cleared.

use chrono::{DateTime, Utc};

use super::types::PathSnapshot;

/// Whether a snapshot replaced the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accepted,
    /// Discarded because it is not newer than what is displayed.
    Stale { current: u64, offered: u64 },
}

/// The single retained snapshot plus bookkeeping about how it got there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconciledState {
    pub snapshot: PathSnapshot,
    /// Snapshots accepted since the last clear.
    pub update_count: u64,
    /// Wall-clock time of the last accepted snapshot.
    pub last_update: Option<DateTime<Utc>>,
}

/// Owner of the best known path.
#[derive(Debug, Clone, Default)]
pub struct PathReconciler {
    state: ReconciledState,
    discarded: u64,
}

impl PathReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a snapshot.
    ///
    /// Accepted iff its iteration is greater than the current one, or the
    /// current path is empty. The empty-path case lets the very first snapshot
    /// in, whatever its iteration, so a listener that joins late still shows
    /// the latest state. An accepted snapshot replaces the state wholesale.
    ///
    /// Stale snapshots are counted and dropped; they are expected traffic,
    /// not errors.
    pub fn accept(&mut self, snapshot: PathSnapshot) -> Acceptance {
        let current = &self.state.snapshot;
        if snapshot.iteration > current.iteration || current.path.is_empty() {
            self.state.snapshot = snapshot;
            self.state.update_count += 1;
            self.state.last_update = Some(Utc::now());
            return Acceptance::Accepted;
        }

        self.discarded += 1;
        log::debug!(
            "Discarding stale path snapshot (iteration {} <= {}), {} discarded so far",
            snapshot.iteration,
            current.iteration,
            self.discarded
        );
        Acceptance::Stale {
            current: current.iteration,
            offered: snapshot.iteration,
        }
    }

    /// Reset to the empty snapshot and zero all counters.
    pub fn clear(&mut self) {
        self.state = ReconciledState::default();
        self.discarded = 0;
    }

    pub fn current(&self) -> &PathSnapshot {
        &self.state.snapshot
    }

    #[cfg(test)]
    pub fn state(&self) -> &ReconciledState {
        &self.state
    }

    pub fn update_count(&self) -> u64 {
        self.state.update_count
    }

    pub fn discarded_count(&self) -> u64 {
        self.discarded
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state.last_update
    }

    #[cfg(test)]
    pub fn has_path(&self) -> bool {
        !self.state.snapshot.path.is_empty()
    }
}
