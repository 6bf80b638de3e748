//! Content-addressed blob storage
//!
//! The profile pipeline only needs two calls: `add(bytes) -> id` and
//! `fetch(id) -> stream`. Backends:
//!
//! | Backend | Ids | Notes |
//! |---------|-----|-------|
//! | [`MemoryContentStore`] | CIDv1 computed locally | process-local |
//! | [`FsContentStore`] | CIDv1 computed locally | one file per id |
//! | `IpfsHttpStore` | assigned by the node | `ipfs` feature |
//!
//! A fetched stream is finite and single pass. Use [`read_all`] to buffer it.

mod fs;
#[cfg(feature = "ipfs")]
mod ipfs;
mod memory;

pub use fs::FsContentStore;
#[cfg(feature = "ipfs")]
pub use ipfs::IpfsHttpStore;
pub use memory::MemoryContentStore;

use async_trait::async_trait;
use bech32::ToBase32;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::AmdtelResult;

/// Chunk size for streams produced by local backends.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// CIDv1 header: version 1, raw codec, sha2-256 multihash of 32 bytes.
const CID_V1_RAW_SHA256: [u8; 4] = [0x01, 0x55, 0x12, 0x20];
const BASE32_LOWER: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Content identifier as handed out by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    /// CIDv1 (raw, sha2-256, multibase base32) of `bytes`.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        let mut binary = CID_V1_RAW_SHA256.to_vec();
        binary.extend_from_slice(&Sha256::digest(bytes));
        let encoded: String = binary
            .to_base32()
            .into_iter()
            .map(|group| BASE32_LOWER[group.to_u8() as usize] as char)
            .collect();
        Self(format!("b{encoded}"))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Usable as a single path segment: non-empty ASCII alphanumerics.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str { &self.0 }
}

pub type ContentStream = BoxStream<'static, AmdtelResult<Vec<u8>>>;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes`; identical bytes may map to the same id.
    async fn add(&self, bytes: Vec<u8>) -> AmdtelResult<ContentId>;

    /// Stream the bytes behind `id`. Unknown ids fail with `NotFound`.
    async fn fetch(&self, id: &ContentId) -> AmdtelResult<ContentStream>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Drain a fetch stream into one buffer.
pub async fn read_all(mut stream: ContentStream) -> AmdtelResult<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

/// Split an owned buffer into a single-pass chunk stream.
pub(crate) fn chunked(bytes: Vec<u8>) -> ContentStream {
    let chunks: Vec<AmdtelResult<Vec<u8>>> = bytes.chunks(CHUNK_SIZE).map(|c| Ok(c.to_vec())).collect();
    futures::stream::iter(chunks).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cid_matches_ipfs_raw_leaves() {
        // `ipfs add --cid-version 1 --raw-leaves` of "hello world"
        assert_eq!(
            ContentId::for_bytes(b"hello world").as_str(),
            "bafkreifzjut3te2nhyekklss27nh3k72ysco7y32koao5eei66wof36n5e"
        );
    }

    #[test]
    fn cid_shape() {
        let id = ContentId::for_bytes(b"");
        assert!(id.as_str().starts_with("bafkrei"));
        assert_eq!(id.as_str().len(), 59);
        assert!(id.is_path_safe());
        assert!(!ContentId::new("../etc/passwd").is_path_safe());
        assert!(!ContentId::new("").is_path_safe());
    }

    #[tokio::test]
    async fn read_all_joins_chunks() {
        let data = vec![7u8; CHUNK_SIZE * 2 + 5];
        let joined = read_all(chunked(data.clone())).await.unwrap();
        assert_eq!(joined, data);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ContentId::new("bafy");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bafy\"");
    }
}
