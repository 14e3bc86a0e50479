//! # Mock Proof Backend
//!
//! A deterministic, transparent backend for development and testing.
//! "Proofs" are domain-separated SHA-256 digests over their inputs.
//! Sealing is real: AES-256-GCM under a key derived with HKDF-SHA256 from a
//! per-process master key, salted with the fingerprint of the recipient
//! public key. The fingerprint is also bound as associated data, so a
//! payload cannot be re-labelled to another key.
//!
//! ## How It Works
//!
//! - `commit()` is `SHA256(tag || len(option) || option || secret)`: binding
//!   through the hash, hiding through the 256-bit secret.
//! - A vote proof is only produced if the witness opens the commitment and
//!   the option is on the ballot.
//! - `verify_in_pool()` checks the ledger's Merkle Mountain Range witness
//!   against the reported root.
//!
//! ## Security Warning
//!
//! **NOT PRIVATE.** Anyone holding the inputs can recompute every proof.
//! Public keys are opaque labels; the master key stands in for every
//! recipient's private key. Use only in tests and local simulations.
//!
//! ## Fault Injection
//!
//! Each stage can be told to fail at runtime so that callers can exercise
//! their failure paths, and every call is counted.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::Aes256Gcm;
use async_trait::async_trait;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;
use zkvote_core::{sha256, ContentDigest, Sha256Accumulator};
use zkvote_crypto::{random_bytes, verify_inclusion, InclusionWitness, PoolRoot, VoterSecret};

use crate::traits::{
    AggregatedProof, BackendError, Ciphertext, Commitment, Proof, ProofBackend, ProofKind,
    ProofRequest,
};

/// Snapshot of how many times each backend operation was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub commit: usize,
    pub prove: usize,
    pub aggregate: usize,
    pub encrypt: usize,
    pub decrypt: usize,
    pub verify_in_pool: usize,
}

impl CallCounts {
    /// Calls made for vote casting (excludes registration-time
    /// encrypt/decrypt).
    pub fn vote_path(&self) -> usize {
        self.commit + self.prove + self.aggregate + self.verify_in_pool
    }
}

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SEAL_INFO: &[u8] = b"zkvote/mock/seal/v1";

#[derive(Debug, Default)]
struct Counters {
    commit: AtomicUsize,
    prove: AtomicUsize,
    aggregate: AtomicUsize,
    encrypt: AtomicUsize,
    decrypt: AtomicUsize,
    verify_in_pool: AtomicUsize,
}

/// Transparent SHA-256 proof backend. **NOT PRIVATE.**
pub struct MockProofBackend {
    master_key: Zeroizing<[u8; 32]>,
    latency: Option<Duration>,
    unavailable: AtomicBool,
    fail_proving: AtomicBool,
    fail_aggregation: AtomicBool,
    fail_pool_verification: AtomicBool,
    counters: Counters,
}

impl std::fmt::Debug for MockProofBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProofBackend")
            .field("master_key", &"[REDACTED]")
            .field("latency", &self.latency)
            .field("calls", &self.calls())
            .finish()
    }
}

impl Default for MockProofBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProofBackend {
    /// A backend with a fresh random master key and no latency.
    pub fn new() -> Self {
        Self {
            master_key: Zeroizing::new(random_bytes::<32>()),
            latency: None,
            unavailable: AtomicBool::new(false),
            fail_proving: AtomicBool::new(false),
            fail_aggregation: AtomicBool::new(false),
            fail_pool_verification: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Sleep this long inside every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_unavailable(&self, on: bool) {
        self.unavailable.store(on, Ordering::SeqCst);
    }

    /// Make `commit`, `prove` and `encrypt` fail.
    pub fn set_fail_proving(&self, on: bool) {
        self.fail_proving.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_aggregation(&self, on: bool) {
        self.fail_aggregation.store(on, Ordering::SeqCst);
    }

    /// Make `verify_in_pool` report non-membership.
    pub fn set_fail_pool_verification(&self, on: bool) {
        self.fail_pool_verification.store(on, Ordering::SeqCst);
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            commit: c.commit.load(Ordering::SeqCst),
            prove: c.prove.load(Ordering::SeqCst),
            aggregate: c.aggregate.load(Ordering::SeqCst),
            encrypt: c.encrypt.load(Ordering::SeqCst),
            decrypt: c.decrypt.load(Ordering::SeqCst),
            verify_in_pool: c.verify_in_pool.load(Ordering::SeqCst),
        }
    }

    async fn enter(&self, counter: &AtomicUsize, op: &'static str) -> Result<(), BackendError> {
        counter.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(backend = "mock", op, "proof backend call");
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("mock backend switched off".to_string()));
        }
        Ok(())
    }

    fn check_proving(&self) -> Result<(), BackendError> {
        if self.fail_proving.load(Ordering::SeqCst) {
            return Err(BackendError::Internal("injected proving failure".to_string()));
        }
        Ok(())
    }

    fn commitment_digest(value: &str, secret: &[u8; 32]) -> ContentDigest {
        let mut acc = Sha256Accumulator::new();
        acc.update(b"zkvote/mock/commit/v1");
        acc.update(&(value.len() as u64).to_be_bytes());
        acc.update(value.as_bytes());
        acc.update(secret);
        acc.finalize()
    }

    /// AES-256-GCM instance for payloads sealed under `fingerprint`.
    fn cipher_for(&self, fingerprint: &ContentDigest) -> Result<Aes256Gcm, BackendError> {
        let hk = Hkdf::<Sha256>::new(Some(&fingerprint.as_bytes()[..]), &self.master_key[..]);
        let mut key = Zeroizing::new([0u8; 32]);
        hk.expand(SEAL_INFO, &mut key[..])
            .map_err(|e| BackendError::Internal(format!("key derivation failed: {e}")))?;
        Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| BackendError::Internal(format!("key derivation failed: {e}")))
    }
}

fn length_prefixed(acc: &mut Sha256Accumulator, data: &[u8]) {
    acc.update(&(data.len() as u64).to_be_bytes());
    acc.update(data);
}

fn kind_tag(kind: ProofKind) -> u8 {
    match kind {
        ProofKind::Eligibility => 0x01,
        ProofKind::Vote => 0x02,
    }
}

#[async_trait]
impl ProofBackend for MockProofBackend {
    async fn commit(&self, value: &str, secret: &VoterSecret) -> Result<Commitment, BackendError> {
        self.enter(&self.counters.commit, "commit").await?;
        self.check_proving()?;
        Ok(Commitment {
            digest: Self::commitment_digest(value, secret.as_bytes()),
        })
    }

    async fn prove(&self, request: ProofRequest) -> Result<Proof, BackendError> {
        self.enter(&self.counters.prove, "prove").await?;
        self.check_proving()?;

        let kind = request.kind();
        let mut acc = Sha256Accumulator::new();
        match request {
            ProofRequest::Eligibility {
                voter_handle,
                criteria,
            } => {
                acc.update(b"zkvote/mock/eligibility/v1");
                acc.update(voter_handle.as_str().as_bytes());
                length_prefixed(&mut acc, criteria.as_bytes());
            }
            ProofRequest::Vote {
                commitment,
                options,
                witness,
            } => {
                if !options.iter().any(|o| o.as_str() == witness.option.as_str()) {
                    return Err(BackendError::Rejected(
                        "chosen option is not on the ballot".to_string(),
                    ));
                }
                let reopened = Self::commitment_digest(&witness.option, &witness.secret);
                if reopened != commitment.digest {
                    return Err(BackendError::Rejected(
                        "commitment does not open to the witness".to_string(),
                    ));
                }
                acc.update(b"zkvote/mock/vote/v1");
                acc.update(commitment.digest.as_bytes());
                for option in &options {
                    length_prefixed(&mut acc, option.as_bytes());
                }
            }
        }
        Ok(Proof {
            kind,
            bytes: acc.finalize().as_bytes().to_vec(),
        })
    }

    async fn aggregate(&self, proofs: &[Proof]) -> Result<AggregatedProof, BackendError> {
        self.enter(&self.counters.aggregate, "aggregate").await?;
        if self.fail_aggregation.load(Ordering::SeqCst) {
            return Err(BackendError::Internal("injected aggregation failure".to_string()));
        }
        if proofs.is_empty() {
            return Err(BackendError::Rejected("nothing to aggregate".to_string()));
        }
        let mut acc = Sha256Accumulator::new();
        acc.update(b"zkvote/mock/aggregate/v1");
        for proof in proofs {
            acc.update(&[kind_tag(proof.kind)]);
            length_prefixed(&mut acc, &proof.bytes);
        }
        Ok(AggregatedProof {
            components: proofs.iter().map(|p| p.kind).collect(),
            bytes: acc.finalize().as_bytes().to_vec(),
        })
    }

    async fn encrypt(&self, plaintext: &[u8], public_key: &str) -> Result<Ciphertext, BackendError> {
        self.enter(&self.counters.encrypt, "encrypt").await?;
        self.check_proving()?;
        if public_key.trim().is_empty() {
            return Err(BackendError::Rejected("public key is empty".to_string()));
        }
        let key_fingerprint = sha256(public_key.as_bytes());
        let cipher = self.cipher_for(&key_fingerprint)?;
        let nonce = random_bytes::<NONCE_LEN>();
        let mut body = cipher
            .encrypt(
                GenericArray::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: key_fingerprint.as_bytes(),
                },
            )
            .map_err(|_| BackendError::Internal("AES-GCM sealing failed".to_string()))?;
        let tag = body.split_off(body.len() - TAG_LEN);
        Ok(Ciphertext {
            key_fingerprint,
            nonce: nonce.to_vec(),
            body,
            tag,
        })
    }

    async fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Zeroizing<Vec<u8>>, BackendError> {
        self.enter(&self.counters.decrypt, "decrypt").await?;
        if ciphertext.nonce.len() != NONCE_LEN || ciphertext.tag.len() != TAG_LEN {
            return Err(BackendError::Decryption(format!(
                "expected a {NONCE_LEN}-byte nonce and a {TAG_LEN}-byte tag"
            )));
        }
        let cipher = self.cipher_for(&ciphertext.key_fingerprint)?;
        let mut sealed = Vec::with_capacity(ciphertext.body.len() + TAG_LEN);
        sealed.extend_from_slice(&ciphertext.body);
        sealed.extend_from_slice(&ciphertext.tag);
        let plaintext = cipher
            .decrypt(
                GenericArray::from_slice(&ciphertext.nonce),
                Payload {
                    msg: &sealed,
                    aad: ciphertext.key_fingerprint.as_bytes(),
                },
            )
            .map_err(|_| BackendError::Decryption("authentication tag mismatch".to_string()))?;
        Ok(Zeroizing::new(plaintext))
    }

    async fn verify_in_pool(
        &self,
        commitment: &Commitment,
        proof: &AggregatedProof,
        root: &PoolRoot,
        witness: &InclusionWitness,
    ) -> Result<bool, BackendError> {
        self.enter(&self.counters.verify_in_pool, "verify_in_pool").await?;
        if self.fail_pool_verification.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let covers_vote = proof.components.contains(&ProofKind::Vote)
            && proof.components.contains(&ProofKind::Eligibility);
        Ok(covers_vote && verify_inclusion(&commitment.digest, witness, root))
    }

    fn backend_name(&self) -> &str {
        "mock-sha256"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::VoteWitness;
    use std::sync::Arc;
    use zkvote_core::VoterHandle;
    use zkvote_crypto::PoolAccumulator;

    fn options() -> Vec<String> {
        vec!["yes".to_string(), "no".to_string()]
    }

    async fn vote_proof(
        backend: &MockProofBackend,
        option: &str,
        secret: &VoterSecret,
    ) -> Result<(Commitment, Proof), BackendError> {
        let commitment = backend.commit(option, secret).await?;
        let proof = backend
            .prove(ProofRequest::Vote {
                commitment,
                options: options(),
                witness: VoteWitness::new(option, secret),
            })
            .await?;
        Ok((commitment, proof))
    }

    #[tokio::test]
    async fn commitment_binds_option_and_hides_with_secret() {
        let backend = MockProofBackend::new();
        let s1 = VoterSecret::from_bytes([1; 32]);
        let s2 = VoterSecret::from_bytes([2; 32]);
        let a = backend.commit("yes", &s1).await.unwrap();
        assert_eq!(a, backend.commit("yes", &s1).await.unwrap());
        assert_ne!(a, backend.commit("no", &s1).await.unwrap());
        assert_ne!(a, backend.commit("yes", &s2).await.unwrap());
    }

    #[tokio::test]
    async fn vote_proof_requires_option_on_ballot() {
        let backend = MockProofBackend::new();
        let secret = VoterSecret::generate();
        let err = vote_proof(&backend, "maybe", &secret).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
    }

    #[tokio::test]
    async fn vote_proof_requires_opening() {
        let backend = MockProofBackend::new();
        let secret = VoterSecret::generate();
        let commitment = backend.commit("yes", &secret).await.unwrap();
        let err = backend
            .prove(ProofRequest::Vote {
                commitment,
                options: options(),
                witness: VoteWitness::new("no", &secret),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
    }

    #[tokio::test]
    async fn aggregate_and_verify_in_pool() {
        let backend = MockProofBackend::new();
        let secret = VoterSecret::generate();
        let (commitment, vote) = vote_proof(&backend, "no", &secret).await.unwrap();
        let eligibility = backend
            .prove(ProofRequest::Eligibility {
                voter_handle: VoterHandle::from_bytes([9; 32]),
                criteria: "resident".to_string(),
            })
            .await
            .unwrap();
        let agg = backend.aggregate(&[eligibility, vote]).await.unwrap();

        let mut pool = PoolAccumulator::new();
        pool.append(&sha256(b"someone else"));
        let idx = pool.append(&commitment.digest);
        let witness = pool.witness(idx).unwrap();
        assert!(backend
            .verify_in_pool(&commitment, &agg, &pool.root(), &witness)
            .await
            .unwrap());
        assert!(!backend
            .verify_in_pool(&commitment, &agg, &PoolRoot::EMPTY, &witness)
            .await
            .unwrap());

        backend.set_fail_pool_verification(true);
        assert!(!backend
            .verify_in_pool(&commitment, &agg, &pool.root(), &witness)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn aggregation_failure_is_injectable() {
        let backend = MockProofBackend::new();
        backend.set_fail_aggregation(true);
        let proof = Proof {
            kind: ProofKind::Vote,
            bytes: vec![1, 2, 3],
        };
        assert!(backend.aggregate(&[proof.clone()]).await.is_err());
        backend.set_fail_aggregation(false);
        assert!(backend.aggregate(&[proof]).await.is_ok());
        assert!(backend.aggregate(&[]).await.is_err());
    }

    #[tokio::test]
    async fn encrypt_decrypt_and_tamper_detection() {
        let backend = MockProofBackend::new();
        let ct = backend.encrypt(b"sealed payload", "pk-voter").await.unwrap();
        assert_ne!(ct.body, b"sealed payload".to_vec());
        assert_eq!(backend.decrypt(&ct).await.unwrap().as_slice(), b"sealed payload");

        let mut tampered = ct.clone();
        tampered.body[0] ^= 0xff;
        assert!(matches!(
            backend.decrypt(&tampered).await,
            Err(BackendError::Decryption(_))
        ));

        let mut bad_tag = ct.clone();
        bad_tag.tag[15] ^= 0x01;
        assert!(backend.decrypt(&bad_tag).await.is_err());

        let other = MockProofBackend::new();
        assert!(other.decrypt(&ct).await.is_err());
        assert!(backend.encrypt(b"x", "  ").await.is_err());
    }

    #[tokio::test]
    async fn extended_body_is_rejected() {
        let backend = MockProofBackend::new();
        let ct = backend.encrypt(b"yes", "ballot-key").await.unwrap();
        let mut extended = ct.clone();
        extended.body.extend_from_slice(&[0x80, 0, 0, 0, b'n', b'o']);
        assert!(matches!(
            backend.decrypt(&extended).await,
            Err(BackendError::Decryption(_))
        ));
    }

    #[tokio::test]
    async fn payload_is_bound_to_its_public_key() {
        let backend = MockProofBackend::new();
        let ct = backend.encrypt(b"sealed payload", "pk-alice").await.unwrap();
        assert_eq!(ct.key_fingerprint, sha256(b"pk-alice"));
        assert_eq!(ct.nonce.len(), NONCE_LEN);
        assert_eq!(ct.tag.len(), TAG_LEN);

        let mut relabelled = ct.clone();
        relabelled.key_fingerprint = sha256(b"pk-bob");
        assert!(backend.decrypt(&relabelled).await.is_err());
    }

    #[tokio::test]
    async fn malformed_ciphertext_is_a_decryption_error() {
        let backend = MockProofBackend::new();
        let mut ct = backend.encrypt(b"x", "k").await.unwrap();
        ct.nonce.push(0);
        assert!(matches!(
            backend.decrypt(&ct).await,
            Err(BackendError::Decryption(_))
        ));
    }

    #[tokio::test]
    async fn two_encryptions_differ() {
        let backend = MockProofBackend::new();
        let a = backend.encrypt(b"yes", "ballot-key").await.unwrap();
        let b = backend.encrypt(b"yes", "ballot-key").await.unwrap();
        assert_ne!(a.body, b.body);
    }

    #[tokio::test]
    async fn unavailable_fails_every_call_and_counts() {
        let backend = MockProofBackend::new();
        backend.set_unavailable(true);
        let secret = VoterSecret::generate();
        assert!(matches!(
            backend.commit("yes", &secret).await,
            Err(BackendError::Unavailable(_))
        ));
        assert_eq!(backend.calls().commit, 1);
        assert_eq!(backend.calls().vote_path(), 1);
    }

    #[test]
    fn trait_is_object_safe() {
        let _backend: Arc<dyn ProofBackend> = Arc::new(MockProofBackend::new());
    }

    #[test]
    fn debug_redacts_master_key() {
        let dbg = format!("{:?}", MockProofBackend::new());
        assert!(dbg.contains("REDACTED"));
    }
}
