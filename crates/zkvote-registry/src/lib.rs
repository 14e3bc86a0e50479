//! # zkvote-registry — Credential Issuer and Voter Registry
//!
//! Registration turns a real-world identity into an anonymous credential:
//! a random voter handle plus a salted digest of the identity. The identity
//! itself is sealed under the caller's public key and never stored in
//! plaintext.
//!
//! ## Security Invariant
//!
//! - The identity lives only in an [`IdentitySecret`](zkvote_crypto::IdentitySecret)
//!   for the duration of issuance and is zeroized afterwards.
//! - Neither the identity nor the credential digest is ever logged.
//! - Credential verification fails closed: any backend error reads as
//!   "not verified".

pub mod issuer;
pub mod registry;

pub use issuer::{CredentialIssuer, IssuedCredential};
pub use registry::{RegistrationResult, VoterCredential, VoterRegistry};
