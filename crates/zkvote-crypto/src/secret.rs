//! # Secret Material
//!
//! Wrappers for values that must not outlive their use: the voter's real
//! identity, the per-registration salt, and the per-vote commitment secret.
//!
//! ## Security Invariant
//!
//! Every type here zeroizes its buffer on drop and has a `Debug` that prints
//! only a redaction marker. None implements `Clone` or `Serialize`.

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::random::random_bytes;

/// A voter's real-world identity string, held only while a credential is
/// being issued.
#[derive(Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct IdentitySecret(String);

impl IdentitySecret {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True if the identity has no non-whitespace content.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for IdentitySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdentitySecret([REDACTED])")
    }
}

/// 16 random bytes mixed into the credential digest.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Salt([u8; 16]);

impl Salt {
    pub fn generate() -> Self {
        Self(random_bytes::<16>())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Salt([REDACTED])")
    }
}

/// The 32-byte blinding secret for a single vote commitment.
///
/// Generated client-side and never stored by the service.
#[derive(Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(try_from = "String")]
pub struct VoterSecret([u8; 32]);

impl VoterSecret {
    pub fn generate() -> Self {
        Self(random_bytes::<32>())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex encoding for transport to the service. The returned string is
    /// itself secret.
    pub fn to_hex(&self) -> zeroize::Zeroizing<String> {
        zeroize::Zeroizing::new(zkvote_core::digest::to_hex(&self.0))
    }
}

impl TryFrom<String> for VoterSecret {
    type Error = &'static str;

    fn try_from(mut value: String) -> Result<Self, Self::Error> {
        let parsed = zkvote_core::ContentDigest::from_hex(&value)
            .map(|d| Self(*d.as_bytes()))
            .map_err(|_| "voter secret must be 64 lowercase hex characters");
        value.zeroize();
        parsed
    }
}

impl std::fmt::Debug for VoterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VoterSecret([REDACTED])")
    }
}
