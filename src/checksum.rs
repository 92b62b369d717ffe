//! Checksum utilities for artifact manifests and identity suffixes

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum for generated content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a string
    pub fn of_str(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` hex characters, used for short disambiguation suffixes
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        let computed = Self::of_str(content);
        self.0 == computed.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = "export default function Hero() {}";
        assert_eq!(Checksum::of_str(content), Checksum::of_str(content));
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(Checksum::of_str("view-1"), Checksum::of_str("view-2"));
    }

    #[test]
    fn test_short_suffix() {
        let checksum = Checksum::of_str("view-1");
        assert_eq!(checksum.short(6).len(), 6);
        assert!(checksum.as_str().starts_with(checksum.short(6)));
        assert!(checksum.verify("view-1"));
    }
}
