use std::path::PathBuf;

use uuid::Uuid;

use crate::error::{Error, Result};

/// Opaque blob sink for checklist photos. Contents are never inspected;
/// callers only ever get back the reference path.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Internal(format!("creating media dir failed: {}", e)))
    }

    /// Write the uploaded bytes and return the opaque `/media/...` reference
    /// stored on the checklist item.
    pub async fn store(&self, job_id: u64, item_id: u64, bytes: &[u8]) -> Result<String> {
        let name = format!("job{}_item{}_{}.bin", job_id, item_id, Uuid::new_v4());
        let dest = self.dir.join(&name);
        tokio::fs::write(&dest, bytes)
            .await
            .map_err(|e| Error::Internal(format!("writing photo blob failed: {}", e)))?;
        tracing::debug!(job_id, item_id, path = %dest.display(), "Photo stored");
        Ok(format!("/media/{}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> MediaStore {
        let dir = std::env::temp_dir().join(format!("turnover-media-{}", Uuid::new_v4()));
        MediaStore::new(dir)
    }

    #[tokio::test]
    async fn test_store_writes_blob_and_returns_reference() {
        let store = temp_store();
        store.ensure_dir().await.unwrap();

        let path = store.store(3, 7, b"jpeg bytes").await.unwrap();
        assert!(path.starts_with("/media/job3_item7_"));

        let name = path.strip_prefix("/media/").unwrap();
        let on_disk = tokio::fs::read(store.dir.join(name)).await.unwrap();
        assert_eq!(on_disk, b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_store_without_dir_fails_cleanly() {
        let store = temp_store();
        // ensure_dir deliberately not called
        assert!(matches!(
            store.store(1, 1, b"x").await,
            Err(Error::Internal(_))
        ));
    }
}
