//! # Ballot Model
//!
//! ```text
//! Created ──(now ≥ open_at)──▶ Open ──(now ≥ close_at)──▶ Closed
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use zkvote_core::{BallotId, Timestamp, VoteError};

/// What an election administrator submits to create a ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub open_at: Timestamp,
    pub close_at: Timestamp,
    /// Ordered choices.
    pub options: Vec<String>,
    /// Opaque descriptor handed to the eligibility prover.
    #[serde(default)]
    pub eligibility_criteria: String,
    /// Key that encrypted votes are sealed under.
    pub public_key: String,
}

impl BallotSpec {
    /// Check structural validity. Fails with `InvalidBallotSpec`.
    pub fn validate(&self) -> Result<(), VoteError> {
        let invalid = |m: &str| Err(VoteError::InvalidBallotSpec(m.to_string()));

        if self.title.trim().is_empty() {
            return invalid("title must not be blank");
        }
        if self.options.len() < 2 {
            return invalid("a ballot needs at least two options");
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return invalid("options must not be blank");
        }
        let mut seen = HashSet::new();
        if !self.options.iter().all(|o| seen.insert(o.trim())) {
            return invalid("options must be distinct");
        }
        if self.open_at >= self.close_at {
            return invalid("close_at must be strictly after open_at");
        }
        if self.public_key.trim().is_empty() {
            return invalid("public key must not be blank");
        }
        Ok(())
    }
}

/// Lifecycle phase of a ballot, derived from its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BallotStatus {
    Created,
    Open,
    Closed,
}

impl std::fmt::Display for BallotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Created => "CREATED",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        })
    }
}

/// An immutable ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub id: BallotId,
    pub title: String,
    pub description: String,
    pub open_at: Timestamp,
    pub close_at: Timestamp,
    pub options: Vec<String>,
    pub eligibility_criteria: String,
    pub public_key: String,
    pub created_at: Timestamp,
}

impl Ballot {
    /// Options are stored trimmed, the same form `validate` compares.
    pub(crate) fn from_spec(id: BallotId, spec: BallotSpec, created_at: Timestamp) -> Self {
        Self {
            id,
            title: spec.title,
            description: spec.description,
            open_at: spec.open_at,
            close_at: spec.close_at,
            options: spec.options.iter().map(|o| o.trim().to_string()).collect(),
            eligibility_criteria: spec.eligibility_criteria,
            public_key: spec.public_key,
            created_at,
        }
    }

    /// `Created` before `open_at`, `Open` in `[open_at, close_at)`,
    /// `Closed` from `close_at` on.
    pub fn status(&self, now: Timestamp) -> BallotStatus {
        if now < self.open_at {
            BallotStatus::Created
        } else if now < self.close_at {
            BallotStatus::Open
        } else {
            BallotStatus::Closed
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}
