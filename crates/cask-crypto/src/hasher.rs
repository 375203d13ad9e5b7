use cask_types::ContentHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"cask-blob-v1"`) that is
/// prepended to every hash computation, followed by `:`.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for encoded blobs.
    pub const BLOB: Self = Self::new("cask-blob-v1");

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentHash::from_bytes(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(ContentHasher::BLOB.hash(data), ContentHasher::BLOB.hash(data));
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let other = ContentHasher::new("cask-other-v1");
        assert_ne!(ContentHasher::BLOB.hash(b"same"), other.hash(b"same"));
    }

    #[test]
    fn domain_hash_differs_from_raw_hash() {
        assert_ne!(ContentHasher::BLOB.hash(b"test"), ContentHash::of(b"test"));
    }

    #[test]
    fn content_changes_the_hash() {
        let hash = ContentHasher::BLOB.hash(b"one");
        assert_ne!(ContentHasher::BLOB.hash(b"two"), hash);
    }
}
