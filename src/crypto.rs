//! Cryptographic logic.

use sha2::{Digest, Sha256};

/// One-way password digest with an optional pepper.
///
/// Comparison is exact-match on the hex digest; verification never recovers
/// the plaintext.
pub struct Hasher(Vec<u8>);

impl Hasher {
    /// Create a new [`Hasher`].
    pub fn new(pepper: impl AsRef<[u8]>) -> Self {
        Self(pepper.as_ref().to_vec())
    }

    /// Digest data into SHA256.
    pub fn digest(&self, data: impl AsRef<[u8]>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hasher.update(data.as_ref());
        let hash = hasher.finalize();

        hex::encode(hash)
    }
}
