//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier that crosses a component boundary.
//! A `VoterHandle` cannot be passed where a `CredentialDigest` is expected,
//! and neither can be confused with a raw string from a request body.
//!
//! ## Security Invariant
//!
//! A `VoterHandle` is 256 bits drawn from the OS CSPRNG at registration and
//! is unrelated to the identity it was issued for. Only its
//! [`short`](VoterHandle::short) prefix is ever written to logs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::digest::{is_lower_hex, to_hex, ContentDigest};

/// Error parsing an identifier from untrusted input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Expected 64 lowercase hex characters.
    #[error("{kind} must be 64 lowercase hex characters")]
    MalformedHex { kind: &'static str },

    /// Idempotency keys must be non-empty and at most 128 characters.
    #[error("idempotency key must be 1..=128 visible ASCII characters")]
    MalformedIdempotencyKey,
}

/// Opaque, unlinkable voter identifier issued at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoterHandle(String);

impl VoterHandle {
    /// Build a handle from 32 random bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(to_hex(&bytes))
    }

    /// Parse a handle supplied by a caller.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        if is_lower_hex(s, 64) {
            Ok(Self(s.to_string()))
        } else {
            Err(IdentifierError::MalformedHex {
                kind: "voter handle",
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log fields.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl TryFrom<String> for VoterHandle {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VoterHandle> for String {
    fn from(h: VoterHandle) -> Self {
        h.0
    }
}

impl std::fmt::Display for VoterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ballot identifier, assigned monotonically from 1 by the ballot store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallotId(pub u64);

impl BallotId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BallotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ballot:{}", self.0)
    }
}

/// One-way digest of `identity || salt`, returned to the voter at
/// registration and presented again when casting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialDigest(String);

impl CredentialDigest {
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        if is_lower_hex(s, 64) {
            Ok(Self(s.to_string()))
        } else {
            Err(IdentifierError::MalformedHex {
                kind: "credential digest",
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<ContentDigest> for CredentialDigest {
    fn from(d: ContentDigest) -> Self {
        Self(d.to_hex())
    }
}

impl TryFrom<String> for CredentialDigest {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CredentialDigest> for String {
    fn from(d: CredentialDigest) -> Self {
        d.0
    }
}

impl std::fmt::Display for CredentialDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-supplied key that makes a registration request idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let ok = !s.is_empty() && s.len() <= 128 && s.bytes().all(|b| b.is_ascii_graphic());
        if ok {
            Ok(Self(s.to_string()))
        } else {
            Err(IdentifierError::MalformedIdempotencyKey)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IdempotencyKey> for String {
    fn from(k: IdempotencyKey) -> Self {
        k.0
    }
}

/// Distinguishes successive casting attempts for the same (voter, ballot)
/// pair so that a superseded attempt cannot move the current marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "attempt:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voter_handle_from_bytes_is_64_hex() {
        let h = VoterHandle::from_bytes([0xab; 32]);
        assert_eq!(h.as_str().len(), 64);
        assert_eq!(h.short(), "abababababab");
        assert_eq!(VoterHandle::parse(h.as_str()).unwrap(), h);
    }

    #[test]
    fn voter_handle_rejects_uppercase_and_short() {
        assert!(VoterHandle::parse(&"AB".repeat(32)).is_err());
        assert!(VoterHandle::parse("abcd").is_err());
        assert!(VoterHandle::parse(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn voter_handle_serde_validates() {
        let ok = format!("\"{}\"", "0f".repeat(32));
        let h: VoterHandle = serde_json::from_str(&ok).unwrap();
        assert_eq!(serde_json::to_string(&h).unwrap(), ok);
        assert!(serde_json::from_str::<VoterHandle>("\"nope\"").is_err());
    }

    #[test]
    fn ballot_id_display_and_serde() {
        let id = BallotId(3);
        assert_eq!(id.to_string(), "ballot:3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");
    }

    #[test]
    fn idempotency_key_bounds() {
        assert!(IdempotencyKey::parse("reg-001").is_ok());
        assert!(IdempotencyKey::parse("").is_err());
        assert!(IdempotencyKey::parse("has space").is_err());
        assert!(IdempotencyKey::parse(&"k".repeat(129)).is_err());
    }

    #[test]
    fn attempt_ids_are_unique() {
        assert_ne!(AttemptId::new(), AttemptId::new());
        assert!(AttemptId::new().to_string().starts_with("attempt:"));
    }
}
