//! # Vote Orchestrator
//!
//! Drives one casting attempt from eligibility check to confirmed receipt:
//!
//! ```text
//! eligibility gate ─▶ duplicate gate ─▶ commit ─▶ prove ×2 ─▶ aggregate
//!        │                  │             (Committed)   (concurrent)
//!    no state          Pending marker
//!                                                          │
//!        Confirmed ◀─ verify in pool ◀─ submit ◀─ encrypt ◀┘
//!                                      (Submitted)
//! ```
//!
//! Every backend and ledger call runs under `call_timeout`. A failure after
//! the duplicate gate rejects the attempt with its [`ErrorKind`]; whether
//! the pair may retry is decided by the kind (see
//! [`AttemptState::admits_new_attempt`]).
//!
//! ## Security Invariant
//!
//! - The chosen option and voter secret never leave this module except as
//!   inputs to the proof backend, and are never logged. They are moved into
//!   a [`VoteChoice`] that the sealing stage consumes, so both are zeroized
//!   before the vote is submitted to the ledger.
//! - The ledger nullifier derives from the credential digest, never from
//!   the public voter handle.
//! - The ledger is authoritative. A spent-nullifier refusal means the pair
//!   has voted: the marker is confirmed and the caller sees `DuplicateVote`.
//! - A vote the ledger accepted but that fails pool verification leaves the
//!   pair blocked and raises an `error!` alert for operators.

use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;
use zeroize::Zeroizing;
use zkvote_ballot::{Ballot, BallotSpec, BallotStatus, BallotStore};
use zkvote_core::{AttemptId, BallotId, Clock, ErrorKind, VoteError, VoterHandle};
use zkvote_crypto::{derive_nullifier, Nullifier, PoolRoot, VoterSecret};
use zkvote_ledger::{BallotAnchor, LedgerAdapter, LedgerError, Rejection, VoteSubmission};
use zkvote_registry::VoterRegistry;
use zkvote_state::{AttemptBook, AttemptError, AttemptKey, AttemptMarker, AttemptState};
use zkvote_zkp::{
    AggregatedProof, BackendError, Ciphertext, Commitment, ProofBackend, ProofRequest, VoteWitness,
};

use crate::config::OrchestratorConfig;
use crate::receipt::{CastVoteRequest, VoteReceipt};

/// The voter's option and blinding secret for one attempt.
struct VoteChoice {
    option: Zeroizing<String>,
    secret: VoterSecret,
}

impl VoteChoice {
    fn new(option: Zeroizing<String>, secret: VoterSecret) -> Self {
        #[cfg(test)]
        tests::LIVE_CHOICES.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Self { option, secret }
    }
}

#[cfg(test)]
impl Drop for VoteChoice {
    fn drop(&mut self) {
        tests::LIVE_CHOICES.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// What the sealing stage hands to submission. Holds nothing the option
/// can be read back from without the backend's keys.
struct SealedVote {
    commitment: Commitment,
    proof: AggregatedProof,
    ciphertext: Ciphertext,
}

pub struct VoteOrchestrator {
    registry: Arc<VoterRegistry>,
    ballots: Arc<BallotStore>,
    backend: Arc<dyn ProofBackend>,
    ledger: Arc<dyn LedgerAdapter>,
    clock: Arc<dyn Clock>,
    book: AttemptBook,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for VoteOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteOrchestrator")
            .field("backend", &self.backend.backend_name())
            .field("ledger", &self.ledger.ledger_name())
            .field("attempts", &self.book.len())
            .field("config", &self.config)
            .finish()
    }
}

impl VoteOrchestrator {
    pub fn new(
        registry: Arc<VoterRegistry>,
        ballots: Arc<BallotStore>,
        backend: Arc<dyn ProofBackend>,
        ledger: Arc<dyn LedgerAdapter>,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            ballots,
            backend,
            ledger,
            clock,
            book: AttemptBook::new(config.attempt_timeout_secs),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<VoterRegistry> {
        &self.registry
    }

    pub fn ballots(&self) -> &Arc<BallotStore> {
        &self.ballots
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Store a ballot and anchor its window on the ledger. If anchoring
    /// fails the stored ballot is discarded.
    pub async fn create_ballot(&self, spec: BallotSpec) -> Result<Ballot, VoteError> {
        let ballot = self.ballots.create(spec)?;
        let anchor = BallotAnchor {
            ballot_id: ballot.id,
            open_at: ballot.open_at,
            close_at: ballot.close_at,
        };
        let anchored = self
            .bounded("ballot anchoring", self.ledger.create_ballot(anchor))
            .await
            .and_then(|r| r.map_err(ledger_failure));
        if let Err(e) = anchored {
            self.ballots.discard(ballot.id);
            tracing::warn!(ballot = %ballot.id, kind = %e.kind(), "ballot anchoring failed; ballot discarded");
            return Err(e);
        }
        Ok(ballot)
    }

    /// Cast a vote.
    ///
    /// Eligibility failures (`NotFound`, `Ineligible`) are reported before
    /// any state is written or any proof work starts. A second attempt for
    /// the same voter and ballot while one is live or confirmed fails with
    /// `DuplicateVote`.
    pub async fn cast_vote(&self, request: CastVoteRequest) -> Result<VoteReceipt, VoteError> {
        let span = tracing::info_span!(
            "cast_vote",
            voter = request.voter_handle.short(),
            ballot = %request.ballot_id,
            attempt = tracing::field::Empty,
        );
        self.cast_vote_inner(request).instrument(span).await
    }

    async fn cast_vote_inner(&self, request: CastVoteRequest) -> Result<VoteReceipt, VoteError> {
        let ballot = self.admit(&request).await?;
        let CastVoteRequest {
            voter_handle,
            credential_digest,
            option,
            voter_secret,
            ..
        } = request;
        let choice = VoteChoice::new(option, voter_secret);
        let nullifier = derive_nullifier(&credential_digest, ballot.id);

        let key = AttemptKey::new(&voter_handle, ballot.id);
        let attempt_id = self
            .book
            .try_begin(&key, self.clock.now())
            .map_err(attempt_failure)?;
        tracing::Span::current().record("attempt", tracing::field::display(attempt_id));

        match self
            .run_attempt(&key, attempt_id, &ballot, &voter_handle, choice, nullifier)
            .await
        {
            Ok(receipt) => {
                tracing::info!("vote confirmed");
                Ok(receipt)
            }
            Err(e) => {
                self.settle_failure(&key, attempt_id, &e);
                Err(e)
            }
        }
    }

    /// Eligibility gate. Reads only; no marker, no proof work.
    async fn admit(&self, request: &CastVoteRequest) -> Result<Ballot, VoteError> {
        let ballot = self.ballots.get(request.ballot_id)?;
        let status = ballot.status(self.clock.now());
        if status != BallotStatus::Open {
            return Err(VoteError::Ineligible(format!("{} is {status}", ballot.id)));
        }

        let verified = tokio::time::timeout(
            self.config.call_timeout,
            self.registry
                .verify_credential(&request.voter_handle, &request.credential_digest),
        )
        .await
        .unwrap_or(false);
        if !verified {
            return Err(VoteError::Ineligible(
                "voter credential could not be verified".to_string(),
            ));
        }

        if !ballot.has_option(&request.option) {
            return Err(VoteError::NotFound(format!(
                "chosen option is not on {}",
                ballot.id
            )));
        }
        Ok(ballot)
    }

    async fn run_attempt(
        &self,
        key: &AttemptKey,
        attempt_id: AttemptId,
        ballot: &Ballot,
        voter_handle: &VoterHandle,
        choice: VoteChoice,
        nullifier: Nullifier,
    ) -> Result<VoteReceipt, VoteError> {
        let SealedVote {
            commitment,
            proof: aggregated,
            ciphertext,
        } = self
            .seal(key, attempt_id, ballot, voter_handle, choice)
            .await?;

        self.advance(key, attempt_id, AttemptState::Submitted)?;
        let submission = VoteSubmission {
            ballot_id: ballot.id,
            ciphertext,
            commitment,
            proof: aggregated.clone(),
            nullifier,
        };
        let outcome = self
            .bounded("vote submission", self.ledger.submit_vote(submission))
            .await?
            .map_err(|e| VoteError::LedgerUnavailable(e.to_string()))?;

        if !outcome.accepted {
            return match outcome.rejection {
                Some(Rejection::NullifierSpent) => {
                    self.book.confirm(key, self.clock.now());
                    Err(VoteError::DuplicateVote(
                        "the ledger already holds a vote from this voter".to_string(),
                    ))
                }
                Some(reason) => Err(VoteError::Ineligible(format!(
                    "ledger refused the vote: {reason}"
                ))),
                None => Err(VoteError::Ineligible("ledger refused the vote".to_string())),
            };
        }

        let Some(witness) = outcome.witness else {
            return Err(VoteError::PoolVerificationFailed(
                "ledger accepted the vote without an inclusion witness".to_string(),
            ));
        };
        let verified = self
            .bounded(
                "pool verification",
                self.backend
                    .verify_in_pool(&commitment, &aggregated, &outcome.new_root, &witness),
            )
            .await;
        match verified {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                return Err(VoteError::PoolVerificationFailed(format!(
                    "commitment not found in the pool of {} at root {}",
                    ballot.id, outcome.new_root
                )));
            }
            Ok(Err(e)) => {
                return Err(VoteError::PoolVerificationFailed(format!(
                    "pool membership could not be checked: {e}"
                )));
            }
            Err(e) => return Err(VoteError::PoolVerificationFailed(e.message().to_string())),
        }

        // The ledger holds the vote, so this overrides a newer attempt that
        // may have taken over a stale marker.
        let confirmed_at = self.clock.now();
        self.book.confirm(key, confirmed_at);
        Ok(VoteReceipt {
            ballot_id: ballot.id,
            commitment_digest: commitment.digest,
            merkle_root: outcome.new_root,
            confirmed_at,
        })
    }

    /// Commit, prove, aggregate and encrypt. Consumes `choice`: the option
    /// and secret are dropped when this returns, on success or failure.
    async fn seal(
        &self,
        key: &AttemptKey,
        attempt_id: AttemptId,
        ballot: &Ballot,
        voter_handle: &VoterHandle,
        choice: VoteChoice,
    ) -> Result<SealedVote, VoteError> {
        let commitment = self
            .proving(
                "commitment",
                self.backend.commit(&choice.option, &choice.secret),
            )
            .await?;
        self.advance(key, attempt_id, AttemptState::Committed)?;

        let eligibility = ProofRequest::Eligibility {
            voter_handle: voter_handle.clone(),
            criteria: ballot.eligibility_criteria.clone(),
        };
        let vote = ProofRequest::Vote {
            commitment,
            options: ballot.options.clone(),
            witness: VoteWitness::new(&choice.option, &choice.secret),
        };
        let (eligibility_proof, vote_proof) = tokio::try_join!(
            self.proving("eligibility proof", self.backend.prove(eligibility)),
            self.proving("vote proof", self.backend.prove(vote)),
        )?;

        let proof = self
            .bounded(
                "proof aggregation",
                self.backend.aggregate(&[eligibility_proof, vote_proof]),
            )
            .await?
            .map_err(|e| VoteError::ProofAggregationFailed(e.to_string()))?;

        let ciphertext = self
            .proving(
                "vote encryption",
                self.backend
                    .encrypt(choice.option.as_bytes(), &ballot.public_key),
            )
            .await?;

        Ok(SealedVote {
            commitment,
            proof,
            ciphertext,
        })
    }

    fn settle_failure(&self, key: &AttemptKey, attempt_id: AttemptId, error: &VoteError) {
        let kind = error.kind();
        if kind == ErrorKind::DuplicateVote {
            // Marker already confirmed on the ledger's word.
            tracing::warn!(kind = %kind, "ledger reports the voter has already voted");
            return;
        }
        if kind == ErrorKind::PoolVerificationFailed {
            tracing::error!(
                kind = %kind,
                message = error.message(),
                "OPERATOR ALERT: ledger accepted a vote that failed pool verification; pair blocked pending reconciliation"
            );
        } else {
            tracing::warn!(kind = %kind, "vote attempt rejected");
        }
        if let Err(e) = self.book.reject(key, attempt_id, kind, self.clock.now()) {
            tracing::debug!(error = %e, "attempt marker no longer owned by this attempt");
        }
    }

    fn advance(
        &self,
        key: &AttemptKey,
        attempt_id: AttemptId,
        to: AttemptState,
    ) -> Result<(), VoteError> {
        self.book
            .advance(key, attempt_id, to, self.clock.now())
            .map_err(attempt_failure)
    }

    /// Run `call` under the per-call deadline. The outer error is the
    /// timeout.
    async fn bounded<T, E>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<Result<T, E>, VoteError> {
        tokio::time::timeout(self.config.call_timeout, call)
            .await
            .map_err(|_| {
                VoteError::Timeout(format!(
                    "{op} did not complete within {}s",
                    self.config.call_timeout.as_secs()
                ))
            })
    }

    async fn proving<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, VoteError> {
        self.bounded(op, call)
            .await?
            .map_err(|e| VoteError::ProofGenerationFailed(format!("{op} failed: {e}")))
    }

    /// Reject every abandoned attempt older than the attempt timeout.
    /// Returns how many were swept.
    pub fn sweep_abandoned(&self) -> usize {
        let swept = self.book.expire_stale(self.clock.now());
        if swept > 0 {
            tracing::info!(swept, "abandoned vote attempts swept");
        }
        swept
    }

    pub fn attempt_state(&self, voter: &VoterHandle, ballot_id: BallotId) -> Option<AttemptState> {
        self.book.state(&AttemptKey::new(voter, ballot_id))
    }

    pub fn attempt_marker(&self, voter: &VoterHandle, ballot_id: BallotId) -> Option<AttemptMarker> {
        self.book.marker(&AttemptKey::new(voter, ballot_id))
    }

    /// Current privacy-pool root of a ballot, as held by the ledger.
    pub async fn pool_root(&self, ballot_id: BallotId) -> Result<PoolRoot, VoteError> {
        self.ballots.get(ballot_id)?;
        self.bounded("pool root lookup", self.ledger.privacy_pool_root(ballot_id))
            .await?
            .map_err(ledger_failure)
    }

    /// Number of votes the ledger accepted for a ballot.
    pub async fn vote_count(&self, ballot_id: BallotId) -> Result<u64, VoteError> {
        self.ballots.get(ballot_id)?;
        self.bounded("vote count lookup", self.ledger.vote_count(ballot_id))
            .await?
            .map_err(ledger_failure)
    }
}

fn attempt_failure(e: AttemptError) -> VoteError {
    match e {
        AttemptError::Duplicate { state } => VoteError::DuplicateVote(format!(
            "a vote attempt for this ballot is already {state}"
        )),
        other => VoteError::Timeout(format!("vote attempt abandoned: {other}")),
    }
}

fn ledger_failure(e: LedgerError) -> VoteError {
    match e {
        LedgerError::UnknownBallot(id) => {
            VoteError::NotFound(format!("{id} is not anchored on the ledger"))
        }
        LedgerError::InvalidAnchor(message) => VoteError::InvalidBallotSpec(message),
        other => VoteError::LedgerUnavailable(other.to_string()),
    }
}
