//! Content fingerprints of the final grid.

use sha2::{Digest, Sha256};

/// Maps a byte buffer to a fixed-length fingerprint string.
pub trait Fingerprint: Send + Sync {
    /// Short algorithm name for reports.
    fn algorithm(&self) -> &'static str;

    /// Fingerprints `bytes`.
    fn digest(&self, bytes: &[u8]) -> String;
}

/// SHA-256, rendered as 64 lowercase hex digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprint;

impl Fingerprint for Sha256Fingerprint {
    fn algorithm(&self) -> &'static str {
        "sha256"
    }

    fn digest(&self, bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }
}
