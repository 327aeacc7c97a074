// ContentDigest - SHA1 fingerprint of a byte stream
// Used as the cache key for parsed mesh files

use digest::Digest;
use std::fmt;

/// SHA1 digest of some content, usable as a map key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; ContentDigest::DIGEST_LENGTH]);

impl ContentDigest {
    pub const DIGEST_LENGTH: usize = 20;

    /// Hash a complete byte slice
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    pub fn as_bytes(&self) -> &[u8; Self::DIGEST_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Incremental hasher for content that arrives in pieces
#[derive(Clone, Default)]
pub struct ContentHasher {
    hasher: sha1::Sha1,
}

impl ContentHasher {
    pub fn new() -> Self {
        ContentHasher {
            hasher: sha1::Sha1::new(),
        }
    }

    /// Update with raw bytes
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finalize the hash computation
    pub fn finalize(self) -> ContentDigest {
        let result = self.hasher.finalize();
        let mut digest = [0u8; ContentDigest::DIGEST_LENGTH];
        digest.copy_from_slice(&result);
        ContentDigest(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_basic() {
        // SHA1("test") = a94a8fe5ccb19ba61c4c0873d391e987982fbbd3
        let digest = ContentDigest::of(b"test");
        assert_eq!(digest.as_bytes()[0], 0xa9);
        assert_eq!(digest.as_bytes()[1], 0x4a);
        assert_eq!(digest.to_string(), "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3");
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = ContentHasher::new();
        hasher.update(b"te");
        hasher.update(b"st");
        assert_eq!(hasher.finalize(), ContentDigest::of(b"test"));
        assert_ne!(ContentDigest::of(b"test"), ContentDigest::of(b"tset"));
    }
}
