use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{chunked, ContentId, ContentStore, ContentStream};
use crate::error::{AmdtelError, AmdtelResult};

/// Process-local store. Clones share the same blobs.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    blobs: Arc<RwLock<HashMap<ContentId, Arc<Vec<u8>>>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.blobs.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.blobs.read().await.is_empty() }

    pub async fn contains(&self, id: &ContentId) -> bool {
        self.blobs.read().await.contains_key(id)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn add(&self, bytes: Vec<u8>) -> AmdtelResult<ContentId> {
        let id = ContentId::for_bytes(&bytes);
        let size = bytes.len();
        self.blobs.write().await.entry(id.clone()).or_insert_with(|| Arc::new(bytes));
        tracing::debug!(cid = %id, size, "blob stored in memory");
        Ok(id)
    }

    async fn fetch(&self, id: &ContentId) -> AmdtelResult<ContentStream> {
        let blob = self.blobs.read().await.get(id).cloned();
        match blob {
            Some(bytes) => Ok(chunked(bytes.to_vec())),
            None => Err(AmdtelError::NotFound(id.clone())),
        }
    }

    fn backend(&self) -> &'static str { "memory" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::read_all;

    #[tokio::test]
    async fn add_then_fetch() {
        let store = MemoryContentStore::new();
        let id = store.add(b"payload".to_vec()).await.unwrap();
        let again = store.add(b"payload".to_vec()).await.unwrap();
        assert_eq!(id, again);
        assert_eq!(store.len().await, 1);

        let bytes = read_all(store.fetch(&id).await.unwrap()).await.unwrap();
        assert_eq!(bytes, b"payload");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryContentStore::new();
        let err = store.fetch(&ContentId::new("bafkreimissing")).await.err().unwrap();
        assert!(matches!(err, AmdtelError::NotFound(_)));
    }
}
