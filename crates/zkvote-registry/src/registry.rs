//! # Voter Registry
//!
//! Owns every [`VoterCredential`]. Records are keyed by voter handle in a
//! sharded `DashMap`, so registrations, verifications and revocations for
//! distinct handles never contend. No map guard is held across an
//! `.await`: sealed payloads are cloned out before unsealing.
//!
//! ## Idempotency
//!
//! A caller-supplied idempotency key is reserved before the issuer runs.
//! A second request with the same key, concurrent or later, fails with
//! `AlreadyRegistered`. If issuance fails the reservation is released so
//! the caller can retry with the same key. A key stays consumed after the
//! credential it produced is revoked.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use zkvote_core::{Clock, CredentialDigest, IdempotencyKey, Timestamp, VoteError, VoterHandle};
use zkvote_crypto::{ct_eq, IdentitySecret};
use zkvote_zkp::{Ciphertext, ProofBackend};

use crate::issuer::{CredentialIssuer, SealedPayload};

/// A registered voter. The identity and credential digest exist only
/// inside `sealed_payload`.
#[derive(Debug, Clone, Serialize)]
pub struct VoterCredential {
    pub voter_handle: VoterHandle,
    pub sealed_payload: Ciphertext,
    pub registered_at: Timestamp,
}

/// Returned to the voter exactly once, at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub voter_handle: VoterHandle,
    pub credential_digest: CredentialDigest,
}

#[derive(Debug, Clone)]
enum KeyState {
    Reserved,
    Completed(VoterHandle),
}

pub struct VoterRegistry {
    issuer: CredentialIssuer,
    backend: Arc<dyn ProofBackend>,
    clock: Arc<dyn Clock>,
    credentials: DashMap<VoterHandle, VoterCredential>,
    idempotency: DashMap<IdempotencyKey, KeyState>,
}

impl std::fmt::Debug for VoterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoterRegistry")
            .field("credentials", &self.credentials.len())
            .field("idempotency_keys", &self.idempotency.len())
            .finish()
    }
}

impl VoterRegistry {
    pub fn new(backend: Arc<dyn ProofBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            issuer: CredentialIssuer::new(backend.clone()),
            backend,
            clock,
            credentials: DashMap::new(),
            idempotency: DashMap::new(),
        }
    }

    /// Register a voter.
    pub async fn register(
        &self,
        identity: IdentitySecret,
        public_key: &str,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<RegistrationResult, VoteError> {
        if let Some(key) = &idempotency_key {
            match self.idempotency.entry(key.clone()) {
                Entry::Occupied(_) => {
                    return Err(VoteError::AlreadyRegistered(
                        "idempotency key has already been used".to_string(),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(KeyState::Reserved);
                }
            }
        }

        let issued = match self.issuer.issue(identity, public_key).await {
            Ok(issued) => issued,
            Err(e) => {
                if let Some(key) = &idempotency_key {
                    self.idempotency
                        .remove_if(key, |_, state| matches!(state, KeyState::Reserved));
                }
                tracing::warn!(kind = %e.kind(), "registration failed");
                return Err(e);
            }
        };

        let handle = issued.voter_handle.clone();
        self.credentials.insert(
            handle.clone(),
            VoterCredential {
                voter_handle: handle.clone(),
                sealed_payload: issued.sealed_payload,
                registered_at: self.clock.now(),
            },
        );
        if let Some(key) = idempotency_key {
            self.idempotency.insert(key, KeyState::Completed(handle.clone()));
        }

        tracing::info!(voter = handle.short(), "voter registered");
        Ok(RegistrationResult {
            voter_handle: handle,
            credential_digest: issued.credential_digest,
        })
    }

    /// Whether `credential_digest` is the digest issued to `voter_handle`.
    ///
    /// `false` for unknown handles, mismatches, and unsealing failures.
    pub async fn verify_credential(
        &self,
        voter_handle: &VoterHandle,
        credential_digest: &CredentialDigest,
    ) -> bool {
        let Some(sealed) = self
            .credentials
            .get(voter_handle)
            .map(|c| c.sealed_payload.clone())
        else {
            return false;
        };

        let plain = match self.backend.decrypt(&sealed).await {
            Ok(plain) => plain,
            Err(e) => {
                tracing::warn!(
                    voter = voter_handle.short(),
                    error = %e,
                    "credential unsealing failed; treating as unverified"
                );
                return false;
            }
        };
        let payload: SealedPayload = match serde_json::from_slice(&plain) {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(
                    voter = voter_handle.short(),
                    "sealed credential payload is malformed; treating as unverified"
                );
                return false;
            }
        };
        ct_eq(
            payload.credential_digest.as_bytes(),
            credential_digest.as_bytes(),
        )
    }

    /// Delete the credential. Returns whether it existed.
    pub fn revoke(&self, voter_handle: &VoterHandle) -> bool {
        let existed = self.credentials.remove(voter_handle).is_some();
        if existed {
            tracing::info!(voter = voter_handle.short(), "voter credential revoked");
        }
        existed
    }

    pub fn check_registration(&self, voter_handle: &VoterHandle) -> bool {
        self.credentials.contains_key(voter_handle)
    }

    pub fn credential(&self, voter_handle: &VoterHandle) -> Option<VoterCredential> {
        self.credentials.get(voter_handle).map(|c| c.clone())
    }

    /// The handle a completed idempotency key produced, if any.
    pub fn handle_for_key(&self, key: &IdempotencyKey) -> Option<VoterHandle> {
        match self.idempotency.get(key).map(|s| s.clone()) {
            Some(KeyState::Completed(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
