//! Per-target load status tracking.
//!
//! A store keeps one [`TargetStatus`] per `(kind, key)` pair rather than one
//! flag for the whole store, so fetches for different entities never
//! overwrite each other's status.  Every fetch is stamped with a sequence
//! number when it begins; only the newest fetch still in flight for a target
//! may settle it, older completions are reported as stale.
//!
//! [`PendingFetch`] ties a ticket to the lifetime of the fetch future: a
//! fetch dropped before it settles gives its ticket back, so the target
//! never stays `loading` on its own.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use nexus_shared::LoadStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchKind {
    Snapshot,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTarget {
    pub kind: FetchKind,
    pub key: String,
}

impl FetchTarget {
    pub fn snapshot(key: impl Into<String>) -> Self {
        Self {
            kind: FetchKind::Snapshot,
            key: key.into(),
        }
    }

    pub fn history(key: impl Into<String>) -> Self {
        Self {
            kind: FetchKind::History,
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetStatus {
    pub status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tickets of fetches still running, oldest first.
    #[serde(skip)]
    in_flight: Vec<u64>,
    #[serde(skip)]
    before_loading: LoadStatus,
}

/// Status of every fetch target a store has seen.
#[derive(Debug, Default)]
pub struct StatusBoard {
    entries: HashMap<FetchTarget, TargetStatus>,
    next_seq: u64,
    last_settled: LoadStatus,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `loading` for `target` and return the ticket of this fetch.
    pub fn begin(&mut self, target: &FetchTarget) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        let entry = self.entries.entry(target.clone()).or_default();
        if entry.in_flight.is_empty() {
            entry.before_loading = entry.status;
        }
        entry.status = LoadStatus::Loading;
        entry.in_flight.push(seq);
        seq
    }

    /// Settle `target` as succeeded. Returns `false` for a stale ticket.
    pub fn succeed(&mut self, target: &FetchTarget, seq: u64) -> bool {
        match self.finish(target, seq) {
            Some(entry) => {
                entry.status = LoadStatus::Succeeded;
                entry.error = None;
                self.last_settled = LoadStatus::Succeeded;
                true
            }
            None => false,
        }
    }

    /// Settle `target` as failed. Returns `false` for a stale ticket.
    pub fn fail(&mut self, target: &FetchTarget, seq: u64, message: impl Into<String>) -> bool {
        match self.finish(target, seq) {
            Some(entry) => {
                entry.status = LoadStatus::Failed;
                entry.error = Some(message.into());
                self.last_settled = LoadStatus::Failed;
                true
            }
            None => false,
        }
    }

    /// Give back the ticket of a fetch that will never settle.
    ///
    /// If an older fetch of the same target is still running it becomes the
    /// current one again; otherwise the target returns to the status it had
    /// before it started loading.  Returns `false` for an unknown ticket.
    pub fn abandon(&mut self, target: &FetchTarget, seq: u64) -> bool {
        let Some(entry) = self.entries.get_mut(target) else {
            return false;
        };
        let before = entry.in_flight.len();
        entry.in_flight.retain(|s| *s != seq);
        if entry.in_flight.len() == before {
            return false;
        }
        if entry.in_flight.is_empty() {
            entry.status = entry.before_loading;
        }
        true
    }

    pub fn get(&self, target: &FetchTarget) -> TargetStatus {
        self.entries.get(target).cloned().unwrap_or_default()
    }

    /// Statuses of every target of `kind`, keyed by entity key.
    pub fn by_kind(&self, kind: FetchKind) -> HashMap<String, TargetStatus> {
        self.entries
            .iter()
            .filter(|(t, _)| t.kind == kind)
            .map(|(t, s)| (t.key.clone(), s.clone()))
            .collect()
    }

    /// Store-wide summary for views that show a single spinner or banner:
    /// loading while anything is in flight, otherwise the outcome of the
    /// most recently settled fetch.
    pub fn overall(&self) -> LoadStatus {
        if self.entries.values().any(|e| !e.in_flight.is_empty()) {
            LoadStatus::Loading
        } else {
            self.last_settled
        }
    }

    /// Retire `seq`. Yields the entry only when `seq` was the newest ticket
    /// in flight, in which case every older ticket is retired with it.
    fn finish(&mut self, target: &FetchTarget, seq: u64) -> Option<&mut TargetStatus> {
        let entry = self.entries.get_mut(target)?;
        if entry.in_flight.last() == Some(&seq) {
            entry.in_flight.clear();
            Some(entry)
        } else {
            entry.in_flight.retain(|s| *s != seq);
            None
        }
    }
}

/// Lock a board shared between a store and its pending fetches.
pub(crate) fn lock_board(board: &Mutex<StatusBoard>) -> std::sync::MutexGuard<'_, StatusBoard> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A fetch that has entered `loading` and holds a ticket on the board.
///
/// Settle it with [`succeed`](Self::succeed), [`fail`](Self::fail) or
/// [`abandon`](Self::abandon).  Dropping it unsettled abandons the ticket.
pub(crate) struct PendingFetch<'a> {
    board: &'a Mutex<StatusBoard>,
    target: FetchTarget,
    seq: u64,
    settled: bool,
}

impl<'a> PendingFetch<'a> {
    pub fn begin(board: &'a Mutex<StatusBoard>, target: FetchTarget) -> Self {
        let seq = lock_board(board).begin(&target);
        Self {
            board,
            target,
            seq,
            settled: false,
        }
    }

    pub fn succeed(mut self) -> bool {
        self.settled = true;
        lock_board(self.board).succeed(&self.target, self.seq)
    }

    pub fn fail(mut self, message: impl Into<String>) -> bool {
        self.settled = true;
        lock_board(self.board).fail(&self.target, self.seq, message)
    }

    pub fn abandon(mut self) -> bool {
        self.settled = true;
        lock_board(self.board).abandon(&self.target, self.seq)
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(key = %self.target.key, kind = ?self.target.kind, "Fetch dropped before settling");
            lock_board(self.board).abandon(&self.target, self.seq);
        }
    }
}
