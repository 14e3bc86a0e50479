//! # Attempt Lifecycle
//!
//! States and transitions for a single casting attempt. Terminal states
//! (`Confirmed`, `Rejected`) are final for the attempt; whether the pair may
//! be retried is a separate question answered by
//! [`AttemptState::admits_new_attempt`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkvote_core::{AttemptId, ErrorKind, Timestamp};

/// Where a casting attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptState {
    /// Duplicate gate passed; no cryptographic work done yet.
    Pending,
    /// Commitment produced.
    Committed,
    /// Handed to the ledger.
    Submitted,
    /// Ledger accepted the vote and pool membership verified.
    Confirmed,
    /// Attempt failed with the given kind.
    Rejected(ErrorKind),
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected(_))
    }

    /// Whether a fresh attempt may replace a marker in this state
    /// (ignoring staleness).
    ///
    /// Only a rejection whose kind releases the marker frees the pair. A
    /// pool-verification failure leaves the pair blocked because the ledger
    /// may hold the vote.
    pub fn admits_new_attempt(&self) -> bool {
        match self {
            Self::Rejected(kind) => kind.releases_marker() || *kind == ErrorKind::Ineligible,
            _ => false,
        }
    }

    fn can_advance_to(&self, to: &AttemptState) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Committed)
                | (Self::Committed, Self::Submitted)
                | (Self::Submitted, Self::Confirmed)
        ) || (!self.is_terminal() && matches!(to, Self::Rejected(_)))
    }
}

impl std::fmt::Display for AttemptState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("PENDING"),
            Self::Committed => f.write_str("COMMITTED"),
            Self::Submitted => f.write_str("SUBMITTED"),
            Self::Confirmed => f.write_str("CONFIRMED"),
            Self::Rejected(kind) => write!(f, "REJECTED({kind})"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// The pair already has a marker that blocks a new attempt.
    #[error("attempt already exists in state {state}")]
    Duplicate { state: AttemptState },

    #[error("no attempt recorded for this voter and ballot")]
    Missing,

    /// A newer attempt replaced this one.
    #[error("{attempt} was superseded by a newer attempt")]
    Superseded { attempt: AttemptId },

    #[error("invalid attempt transition: {from} -> {to}")]
    InvalidTransition {
        from: AttemptState,
        to: AttemptState,
    },
}

/// Record of a marker state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptTransition {
    pub from: AttemptState,
    pub to: AttemptState,
    pub at: Timestamp,
}

/// The persistent part of a vote attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptMarker {
    pub attempt_id: AttemptId,
    pub state: AttemptState,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
    pub history: Vec<AttemptTransition>,
}

impl AttemptMarker {
    /// A fresh `Pending` marker.
    pub fn begin(now: Timestamp) -> Self {
        Self {
            attempt_id: AttemptId::new(),
            state: AttemptState::Pending,
            started_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    /// Non-terminal and started at least `timeout_secs` before `now`.
    pub fn is_stale(&self, now: Timestamp, timeout_secs: i64) -> bool {
        !self.state.is_terminal() && now.seconds_since(self.started_at) >= timeout_secs
    }

    /// Move to `to` on behalf of `attempt_id`.
    pub fn advance(
        &mut self,
        attempt_id: AttemptId,
        to: AttemptState,
        now: Timestamp,
    ) -> Result<(), AttemptError> {
        if attempt_id != self.attempt_id {
            return Err(AttemptError::Superseded {
                attempt: attempt_id,
            });
        }
        if !self.state.can_advance_to(&to) {
            return Err(AttemptError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.do_transition(to, now);
        Ok(())
    }

    /// Record an authoritative ledger acceptance, regardless of which
    /// attempt currently owns the marker.
    pub fn force_confirm(&mut self, now: Timestamp) {
        if self.state != AttemptState::Confirmed {
            self.do_transition(AttemptState::Confirmed, now);
        }
    }

    fn do_transition(&mut self, to: AttemptState, now: Timestamp) {
        self.history.push(AttemptTransition {
            from: self.state,
            to,
            at: now,
        });
        self.state = to;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(1_700_000_000 + secs).unwrap()
    }

    #[test]
    fn happy_path_records_history() {
        let mut m = AttemptMarker::begin(t(0));
        let id = m.attempt_id;
        m.advance(id, AttemptState::Committed, t(1)).unwrap();
        m.advance(id, AttemptState::Submitted, t(2)).unwrap();
        m.advance(id, AttemptState::Confirmed, t(3)).unwrap();
        assert_eq!(m.state, AttemptState::Confirmed);
        assert_eq!(m.history.len(), 3);
        assert_eq!(m.updated_at, t(3));
        assert_eq!(m.history[0].from, AttemptState::Pending);
    }

    #[test]
    fn cannot_skip_states() {
        let mut m = AttemptMarker::begin(t(0));
        let id = m.attempt_id;
        assert_eq!(
            m.advance(id, AttemptState::Confirmed, t(1)),
            Err(AttemptError::InvalidTransition {
                from: AttemptState::Pending,
                to: AttemptState::Confirmed
            })
        );
    }

    #[test]
    fn terminal_states_are_final() {
        let mut m = AttemptMarker::begin(t(0));
        let id = m.attempt_id;
        m.advance(id, AttemptState::Rejected(ErrorKind::Timeout), t(1))
            .unwrap();
        assert!(m
            .advance(id, AttemptState::Rejected(ErrorKind::Timeout), t(2))
            .is_err());
        assert!(m.advance(id, AttemptState::Committed, t(2)).is_err());
    }

    #[test]
    fn foreign_attempt_is_superseded() {
        let mut m = AttemptMarker::begin(t(0));
        let other = AttemptId::new();
        assert!(matches!(
            m.advance(other, AttemptState::Committed, t(1)),
            Err(AttemptError::Superseded { .. })
        ));
    }

    #[test]
    fn force_confirm_overrides_rejection() {
        let mut m = AttemptMarker::begin(t(0));
        let id = m.attempt_id;
        m.advance(id, AttemptState::Rejected(ErrorKind::Timeout), t(1))
            .unwrap();
        m.force_confirm(t(2));
        assert_eq!(m.state, AttemptState::Confirmed);
        m.force_confirm(t(3));
        assert_eq!(m.history.len(), 2);
    }

    #[test]
    fn releasable_rejections() {
        assert!(AttemptState::Rejected(ErrorKind::ProofAggregationFailed).admits_new_attempt());
        assert!(AttemptState::Rejected(ErrorKind::LedgerUnavailable).admits_new_attempt());
        assert!(AttemptState::Rejected(ErrorKind::Ineligible).admits_new_attempt());
        assert!(!AttemptState::Rejected(ErrorKind::PoolVerificationFailed).admits_new_attempt());
        assert!(!AttemptState::Confirmed.admits_new_attempt());
        assert!(!AttemptState::Pending.admits_new_attempt());
    }

    #[test]
    fn staleness_is_measured_from_start() {
        let m = AttemptMarker::begin(t(0));
        assert!(!m.is_stale(t(299), 300));
        assert!(m.is_stale(t(300), 300));
    }

    #[test]
    fn display_and_serde() {
        let s = AttemptState::Rejected(ErrorKind::Timeout);
        assert_eq!(s.to_string(), "REJECTED(TIMEOUT)");
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json["state"], "REJECTED");
        assert_eq!(json["reason"], "TIMEOUT");
        assert_eq!(
            serde_json::to_value(AttemptState::Pending).unwrap()["state"],
            "PENDING"
        );
    }
}
