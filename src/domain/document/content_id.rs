//! Content addressing for cached documents

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content address of a document: the SHA-256 hex digest of its text
///
/// Every id is computed from a fresh hasher, so the id of one document never
/// depends on what was hashed before it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Derive the content id for a text
    pub fn from_text(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an already computed digest (e.g. parsed back from a storage key)
    pub fn from_digest(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Get the hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let id = ContentId::from_text("abc");
        assert_eq!(
            id.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_same_text_same_id() {
        let a = ContentId::from_text("Paris is the capital of France");
        let b = ContentId::from_text("Paris is the capital of France");
        assert_eq!(a, b);
    }

    #[test]
    fn test_independent_of_previous_hashes() {
        let _ = ContentId::from_text("first document");
        let after = ContentId::from_text("second document");
        let fresh = ContentId::from_text("second document");

        assert_eq!(after, fresh);
    }

    #[test]
    fn test_different_text_different_id() {
        assert_ne!(ContentId::from_text("a"), ContentId::from_text("b"));
    }

    #[test]
    fn test_display() {
        let id = ContentId::from_digest("deadbeef");
        assert_eq!(id.to_string(), "deadbeef");
    }
}
