//! Content-storage collaborator. Workers upload their deliverable here and
//! hand the returned hash to `submit_result`; the registry never looks inside.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DEFAULT_GATEWAY: &str = "https://ipfs.io";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub hash: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("refusing to upload empty content {0:?}")]
    EmptyContent(String),
}

pub trait ContentStore: Send + Sync {
    fn upload(&self, name: &str, bytes: &[u8]) -> Result<ContentRef, StorageError>;
}

/// Stand-in for an IPFS pinning service. Hashes are derived from the bytes,
/// so the same upload always yields the same reference.
#[derive(Debug, Clone)]
pub struct MockIpfsStore {
    gateway: String,
}

impl Default for MockIpfsStore {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY)
    }
}

impl MockIpfsStore {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, hash: &str) -> String {
        format!("{}/ipfs/{}", self.gateway, hash)
    }
}

impl ContentStore for MockIpfsStore {
    fn upload(&self, name: &str, bytes: &[u8]) -> Result<ContentRef, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyContent(name.to_string()));
        }

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = hex::encode(hasher.finalize());

        tracing::info!(name, size = bytes.len(), %hash, "simulated content upload");
        Ok(ContentRef {
            url: self.url_for(&hash),
            hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_is_content_addressed() {
        let store = MockIpfsStore::new("https://gateway.example/");
        let a = store.upload("logo.svg", b"<svg/>").unwrap();
        let b = store.upload("copy.svg", b"<svg/>").unwrap();
        let c = store.upload("logo.png", b"png").unwrap();

        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
        assert_eq!(a.hash.len(), 64);
        assert_eq!(a.url, format!("https://gateway.example/ipfs/{}", a.hash));
    }

    #[test]
    fn empty_upload_fails() {
        let store = MockIpfsStore::default();
        assert!(matches!(
            store.upload("empty.txt", b""),
            Err(StorageError::EmptyContent(name)) if name == "empty.txt"
        ));
    }
}
