//! 本地文件系统Blob存储

use crate::blob::{BlobMetadata, BlobStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use stroke_core::{Result, StrokeError};
use tracing::debug;
use uuid::Uuid;

/// 基于本地文件系统的Blob存储
///
/// 每个Blob存为两个文件：`<id>.bin`（原始字节）和`<id>.json`（元数据）。
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn data_path(&self, blob_id: Uuid) -> PathBuf {
        self.base_path.join(format!("{}.bin", blob_id.simple()))
    }

    fn meta_path(&self, blob_id: Uuid) -> PathBuf {
        self.base_path.join(format!("{}.json", blob_id.simple()))
    }

    async fn remove_if_exists(path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StrokeError::Storage(e.to_string())),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, data: &[u8], metadata: BlobMetadata) -> Result<Uuid> {
        let blob_id = Uuid::new_v4();

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StrokeError::Storage(e.to_string()))?;

        let meta_json = serde_json::to_vec(&metadata)?;
        tokio::fs::write(self.data_path(blob_id), data)
            .await
            .map_err(|e| StrokeError::Storage(e.to_string()))?;
        tokio::fs::write(self.meta_path(blob_id), meta_json)
            .await
            .map_err(|e| StrokeError::Storage(e.to_string()))?;

        debug!("Stored blob {} ({} bytes)", blob_id, data.len());
        Ok(blob_id)
    }

    async fn get(&self, blob_id: Uuid) -> Result<(Vec<u8>, BlobMetadata)> {
        let data = match tokio::fs::read(self.data_path(blob_id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StrokeError::NotFound(format!("Blob {} not found", blob_id)));
            }
            Err(e) => return Err(StrokeError::Storage(e.to_string())),
        };

        let meta_json = tokio::fs::read(self.meta_path(blob_id))
            .await
            .map_err(|e| StrokeError::Storage(e.to_string()))?;
        let metadata: BlobMetadata = serde_json::from_slice(&meta_json)?;

        Ok((data, metadata))
    }

    async fn exists(&self, blob_id: Uuid) -> Result<bool> {
        match tokio::fs::try_exists(self.data_path(blob_id)).await {
            Ok(exists) => Ok(exists),
            Err(e) => Err(StrokeError::Storage(e.to_string())),
        }
    }

    async fn delete(&self, blob_id: Uuid) -> Result<()> {
        Self::remove_if_exists(&self.data_path(blob_id)).await?;
        Self::remove_if_exists(&self.meta_path(blob_id)).await?;
        debug!("Deleted blob {}", blob_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_metadata() -> BlobMetadata {
        BlobMetadata {
            filename: "scan.png".to_string(),
            content_type: "image/png".to_string(),
            size: 4,
            uploaded_at: Utc::now(),
            consultation_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let blob_id = store.put(b"\x89PNG", sample_metadata()).await.unwrap();
        assert!(store.exists(blob_id).await.unwrap());

        let (data, meta) = store.get(blob_id).await.unwrap();
        assert_eq!(data, b"\x89PNG");
        assert_eq!(meta.content_type, "image/png");

        store.delete(blob_id).await.unwrap();
        assert!(!store.exists(blob_id).await.unwrap());
        assert!(matches!(
            store.get(blob_id).await,
            Err(StrokeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store.delete(Uuid::new_v4()).await.unwrap();
    }
}
