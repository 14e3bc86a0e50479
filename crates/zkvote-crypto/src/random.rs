//! OS CSPRNG helpers.

use rand_core::{OsRng, RngCore};
use zkvote_core::VoterHandle;

/// `N` bytes from the operating system's CSPRNG.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// A fresh 256-bit voter handle, independent of any identity.
pub fn fresh_voter_handle() -> VoterHandle {
    VoterHandle::from_bytes(random_bytes::<32>())
}
