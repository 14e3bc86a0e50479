//! Shared harness for orchestrator integration tests: a manual clock, the
//! mock proof backend (optionally behind a stalling wrapper), the in-memory
//! ledger and a registry/ballot store pair.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use zeroize::Zeroizing;
use zkvote_ballot::{Ballot, BallotSpec, BallotStore};
use zkvote_core::{BallotId, Clock, ManualClock, VoterHandle};
use zkvote_crypto::{IdentitySecret, InclusionWitness, PoolRoot, VoterSecret};
use zkvote_ledger::InMemoryLedger;
use zkvote_orchestrator::{CastVoteRequest, OrchestratorConfig, VoteOrchestrator};
use zkvote_registry::{RegistrationResult, VoterRegistry};
use zkvote_state::AttemptState;
use zkvote_zkp::{
    AggregatedProof, BackendError, Ciphertext, Commitment, MockProofBackend, Proof,
    ProofBackend, ProofRequest,
};

/// A checkpoint a test can close to hold a call in flight.
#[derive(Default)]
pub struct Gate {
    armed: AtomicBool,
    release: Notify,
}

impl Gate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn open(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.armed.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
    }
}

/// Mock backend that can hold `aggregate` or `verify_in_pool` until a
/// test releases it.
#[derive(Default)]
pub struct StallingBackend {
    pub inner: MockProofBackend,
    pub aggregate_gate: Gate,
    pub verify_gate: Gate,
}

#[async_trait]
impl ProofBackend for StallingBackend {
    async fn commit(&self, value: &str, secret: &VoterSecret) -> Result<Commitment, BackendError> {
        self.inner.commit(value, secret).await
    }

    async fn prove(&self, request: ProofRequest) -> Result<Proof, BackendError> {
        self.inner.prove(request).await
    }

    async fn aggregate(&self, proofs: &[Proof]) -> Result<AggregatedProof, BackendError> {
        self.aggregate_gate.pass().await;
        self.inner.aggregate(proofs).await
    }

    async fn encrypt(&self, plaintext: &[u8], public_key: &str) -> Result<Ciphertext, BackendError> {
        self.inner.encrypt(plaintext, public_key).await
    }

    async fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Zeroizing<Vec<u8>>, BackendError> {
        self.inner.decrypt(ciphertext).await
    }

    async fn verify_in_pool(
        &self,
        commitment: &Commitment,
        proof: &AggregatedProof,
        root: &PoolRoot,
        witness: &InclusionWitness,
    ) -> Result<bool, BackendError> {
        self.verify_gate.pass().await;
        self.inner.verify_in_pool(commitment, proof, root, witness).await
    }

    fn backend_name(&self) -> &str {
        "stalling-mock"
    }
}

pub struct Harness<B> {
    pub clock: Arc<ManualClock>,
    pub backend: Arc<B>,
    pub ledger: Arc<InMemoryLedger>,
    pub registry: Arc<VoterRegistry>,
    pub ballots: Arc<BallotStore>,
    pub orchestrator: Arc<VoteOrchestrator>,
}

pub fn harness() -> Harness<MockProofBackend> {
    harness_with(MockProofBackend::new(), OrchestratorConfig::default())
}

pub fn stalling_harness(config: OrchestratorConfig) -> Harness<StallingBackend> {
    harness_with(StallingBackend::default(), config)
}

pub fn harness_with<B: ProofBackend + 'static>(backend: B, config: OrchestratorConfig) -> Harness<B> {
    let clock = Arc::new(ManualClock::starting_now());
    let backend = Arc::new(backend);
    let ledger = Arc::new(InMemoryLedger::new(clock.clone()));
    let registry = Arc::new(VoterRegistry::new(backend.clone(), clock.clone()));
    let ballots = Arc::new(BallotStore::new(clock.clone()));
    let orchestrator = Arc::new(VoteOrchestrator::new(
        registry.clone(),
        ballots.clone(),
        backend.clone(),
        ledger.clone(),
        clock.clone(),
        config,
    ));
    Harness {
        clock,
        backend,
        ledger,
        registry,
        ballots,
        orchestrator,
    }
}

impl<B> Harness<B> {
    pub fn ballot_spec(&self, options: &[&str], open_offset: i64, close_offset: i64) -> BallotSpec {
        let now = self.clock.now();
        BallotSpec {
            title: "Municipal referendum".to_string(),
            description: "Should the park be extended?".to_string(),
            open_at: now.plus_secs(open_offset),
            close_at: now.plus_secs(close_offset),
            options: options.iter().map(|o| o.to_string()).collect(),
            eligibility_criteria: "resident".to_string(),
            public_key: "ballot-public-key".to_string(),
        }
    }

    /// A ballot opened an hour ago that closes in an hour.
    pub async fn open_ballot(&self, options: &[&str]) -> Ballot {
        self.orchestrator
            .create_ballot(self.ballot_spec(options, -3600, 3600))
            .await
            .unwrap()
    }

    pub async fn voter(&self, identity: &str) -> RegistrationResult {
        self.registry
            .register(IdentitySecret::new(identity), "voter-public-key", None)
            .await
            .unwrap()
    }

    pub fn state(&self, voter: &RegistrationResult, ballot: BallotId) -> Option<AttemptState> {
        self.orchestrator.attempt_state(&voter.voter_handle, ballot)
    }

    /// Poll until the pair's marker reaches `state`.
    pub async fn wait_for_state(&self, voter: &VoterHandle, ballot: BallotId, state: AttemptState) {
        for _ in 0..400 {
            if self.orchestrator.attempt_state(voter, ballot) == Some(state) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("attempt never reached {state}");
    }
}

pub fn request(voter: &RegistrationResult, ballot: BallotId, option: &str) -> CastVoteRequest {
    CastVoteRequest {
        voter_handle: voter.voter_handle.clone(),
        ballot_id: ballot,
        credential_digest: voter.credential_digest.clone(),
        option: Zeroizing::new(option.to_string()),
        voter_secret: VoterSecret::generate(),
    }
}
