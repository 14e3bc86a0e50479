//! # Attempt Book — Duplicate Gate
//!
//! One [`AttemptMarker`] per (voter handle, ballot). `try_begin` is the
//! compare-and-set that admits at most one live attempt per pair: it runs
//! entirely under the `DashMap` entry lock and returns before any proof
//! work starts. No lock is held across an `.await`; callers hold only the
//! returned [`AttemptId`].

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use zkvote_core::{AttemptId, BallotId, ErrorKind, Timestamp, VoterHandle};

use crate::attempt::{AttemptError, AttemptMarker, AttemptState};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    pub voter: VoterHandle,
    pub ballot: BallotId,
}

impl AttemptKey {
    pub fn new(voter: &VoterHandle, ballot: BallotId) -> Self {
        Self {
            voter: voter.clone(),
            ballot,
        }
    }
}

/// Concurrent map of attempt markers.
#[derive(Debug)]
pub struct AttemptBook {
    markers: DashMap<AttemptKey, AttemptMarker>,
    stale_after_secs: i64,
}

impl AttemptBook {
    /// `stale_after_secs` is how long a non-terminal marker blocks the pair
    /// before a new attempt may replace it.
    pub fn new(stale_after_secs: i64) -> Self {
        Self {
            markers: DashMap::new(),
            stale_after_secs,
        }
    }

    /// Atomically start an attempt for `key`.
    ///
    /// Succeeds if the pair has no marker, a releasable rejection, or a
    /// stale non-terminal marker.
    pub fn try_begin(&self, key: &AttemptKey, now: Timestamp) -> Result<AttemptId, AttemptError> {
        match self.markers.entry(key.clone()) {
            Entry::Vacant(slot) => {
                let marker = AttemptMarker::begin(now);
                let id = marker.attempt_id;
                slot.insert(marker);
                Ok(id)
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get();
                let stale = existing.is_stale(now, self.stale_after_secs);
                if !(existing.state.admits_new_attempt() || stale) {
                    return Err(AttemptError::Duplicate {
                        state: existing.state,
                    });
                }
                if stale {
                    tracing::info!(
                        voter = key.voter.short(),
                        ballot = %key.ballot,
                        superseded = %existing.attempt_id,
                        "replacing stale vote attempt"
                    );
                }
                let marker = AttemptMarker::begin(now);
                let id = marker.attempt_id;
                slot.insert(marker);
                Ok(id)
            }
        }
    }

    /// Move the marker for `key` to `to` on behalf of `attempt_id`.
    pub fn advance(
        &self,
        key: &AttemptKey,
        attempt_id: AttemptId,
        to: AttemptState,
        now: Timestamp,
    ) -> Result<(), AttemptError> {
        let mut marker = self.markers.get_mut(key).ok_or(AttemptError::Missing)?;
        marker.advance(attempt_id, to, now)
    }

    /// Reject the attempt with `kind`.
    pub fn reject(
        &self,
        key: &AttemptKey,
        attempt_id: AttemptId,
        kind: ErrorKind,
        now: Timestamp,
    ) -> Result<(), AttemptError> {
        self.advance(key, attempt_id, AttemptState::Rejected(kind), now)
    }

    /// Record that the ledger holds a vote for this pair. Overrides any
    /// state and any attempt ownership, and creates the marker if missing.
    pub fn confirm(&self, key: &AttemptKey, now: Timestamp) {
        self.markers
            .entry(key.clone())
            .or_insert_with(|| AttemptMarker::begin(now))
            .force_confirm(now);
    }

    pub fn state(&self, key: &AttemptKey) -> Option<AttemptState> {
        self.markers.get(key).map(|m| m.state)
    }

    pub fn marker(&self, key: &AttemptKey) -> Option<AttemptMarker> {
        self.markers.get(key).map(|m| m.clone())
    }

    /// Reject every stale non-terminal marker with `Timeout`. Returns how
    /// many were swept.
    pub fn expire_stale(&self, now: Timestamp) -> usize {
        let mut swept = 0;
        for mut entry in self.markers.iter_mut() {
            if entry.is_stale(now, self.stale_after_secs) {
                let id = entry.attempt_id;
                if entry
                    .advance(id, AttemptState::Rejected(ErrorKind::Timeout), now)
                    .is_ok()
                {
                    swept += 1;
                    tracing::warn!(
                        voter = entry.key().voter.short(),
                        ballot = %entry.key().ballot,
                        attempt = %id,
                        "abandoned vote attempt timed out"
                    );
                }
            }
        }
        swept
    }

    pub fn stale_after_secs(&self) -> i64 {
        self.stale_after_secs
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
