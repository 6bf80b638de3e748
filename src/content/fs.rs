//! Filesystem blob store: `{root}/{cid}`, written via a temp file and rename.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use super::{ContentId, ContentStore, ContentStream, CHUNK_SIZE};
use crate::error::{AmdtelError, AmdtelResult};

#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Store rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path { &self.root }

    fn blob_path(&self, id: &ContentId) -> AmdtelResult<PathBuf> {
        if !id.is_path_safe() {
            return Err(AmdtelError::ContentStore(format!("invalid content id {id:?}")));
        }
        Ok(self.root.join(id.as_str()))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn add(&self, bytes: Vec<u8>) -> AmdtelResult<ContentId> {
        let id = ContentId::for_bytes(&bytes);
        let path = self.blob_path(&id)?;
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(cid = %id, "blob already on disk");
            return Ok(id);
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let tmp = self.root.join(format!(".{}.{:016x}.tmp", id, rand::random::<u64>()));
        write_via_temp(&tmp, &path, &bytes).await?;
        tracing::debug!(cid = %id, size = bytes.len(), path = %path.display(), "blob written");
        Ok(id)
    }

    async fn fetch(&self, id: &ContentId) -> AmdtelResult<ContentStream> {
        let path = self.blob_path(id)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AmdtelError::NotFound(id.clone())),
            Err(e) => return Err(e.into()),
        };

        let stream = futures::stream::unfold(Some(file), |state| async move {
            let mut file = state?;
            let mut buf = vec![0u8; CHUNK_SIZE];
            match file.read(&mut buf).await {
                Ok(0) => None,
                Ok(n) => {
                    buf.truncate(n);
                    Some((Ok(buf), Some(file)))
                }
                Err(e) => Some((Err(AmdtelError::from(e)), None)),
            }
        });
        Ok(stream.boxed())
    }

    fn backend(&self) -> &'static str { "fs" }
}

/// Write `bytes` to `tmp`, then rename onto `path`. `tmp` is removed on failure.
async fn write_via_temp(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let written = match tokio::fs::write(tmp, bytes).await {
        Ok(()) => tokio::fs::rename(tmp, path).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        if let Err(e) = tokio::fs::remove_file(tmp).await {
            tracing::debug!(path = %tmp.display(), error = %e, "temp blob not removed");
        }
    }
    written
}
