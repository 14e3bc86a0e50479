//! Constant-time equality for secret-derived byte strings.

use subtle::ConstantTimeEq;

/// Compare two byte strings without an early exit on the first mismatch.
///
/// Lengths are not secret: unequal lengths return `false` immediately.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_and_unequal() {
        assert!(ct_eq(b"abc", b"abc"));
        assert!(!ct_eq(b"abc", b"abd"));
        assert!(!ct_eq(b"abc", b"abcd"));
        assert!(ct_eq(b"", b""));
    }
}
