//! # Credential Issuer
//!
//! `credential_digest = SHA-256(identity || salt)` with a fresh 16-byte
//! salt, and a voter handle drawn independently from the OS CSPRNG. The
//! pair `{identity, credential_digest}` is sealed under the caller's public
//! key through the proof backend.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;
use zkvote_core::{CredentialDigest, Sha256Accumulator, VoteError, VoterHandle};
use zkvote_crypto::{fresh_voter_handle, IdentitySecret, Salt};
use zkvote_zkp::{BackendError, Ciphertext, ProofBackend};

/// The sealed registration payload, as written.
#[derive(Serialize)]
pub(crate) struct SealedPayloadRef<'a> {
    pub identity: &'a str,
    pub credential_digest: &'a str,
}

/// The sealed registration payload, as read back.
#[derive(Deserialize)]
pub(crate) struct SealedPayload {
    #[allow(dead_code)]
    pub identity: IdentitySecret,
    pub credential_digest: String,
}

/// Output of a successful issuance.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub voter_handle: VoterHandle,
    pub credential_digest: CredentialDigest,
    pub sealed_payload: Ciphertext,
}

pub struct CredentialIssuer {
    backend: Arc<dyn ProofBackend>,
}

impl CredentialIssuer {
    pub fn new(backend: Arc<dyn ProofBackend>) -> Self {
        Self { backend }
    }

    /// Issue a credential for `identity`, sealing it under `public_key`.
    pub async fn issue(
        &self,
        identity: IdentitySecret,
        public_key: &str,
    ) -> Result<IssuedCredential, VoteError> {
        if identity.is_blank() {
            return Err(VoteError::IdentityInvalid(
                "identity must not be empty".to_string(),
            ));
        }
        if public_key.trim().is_empty() {
            return Err(VoteError::IdentityInvalid(
                "public key must not be empty".to_string(),
            ));
        }

        let salt = Salt::generate();
        let mut acc = Sha256Accumulator::new();
        acc.update(identity.expose().as_bytes());
        acc.update(salt.as_bytes());
        let credential_digest = CredentialDigest::from(acc.finalize());
        let voter_handle = fresh_voter_handle();

        let payload = serde_json::to_vec(&SealedPayloadRef {
            identity: identity.expose(),
            credential_digest: credential_digest.as_str(),
        })
        .map(Zeroizing::new)
        .map_err(|_| {
            VoteError::ProofGenerationFailed("credential payload encoding failed".to_string())
        })?;
        drop(identity);

        let sealed_payload = self
            .backend
            .encrypt(&payload, public_key)
            .await
            .map_err(|e| match e {
                BackendError::Rejected(reason) => VoteError::IdentityInvalid(reason),
                other => VoteError::ProofGenerationFailed(format!(
                    "credential sealing failed: {other}"
                )),
            })?;

        Ok(IssuedCredential {
            voter_handle,
            credential_digest,
            sealed_payload,
        })
    }
}
