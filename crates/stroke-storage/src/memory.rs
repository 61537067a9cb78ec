//! 内存Blob存储
//!
//! 用于测试和演示环境，不做持久化。

use crate::blob::{BlobMetadata, BlobStore};
use async_trait::async_trait;
use std::collections::HashMap;
use stroke_core::{Result, StrokeError};
use tokio::sync::RwLock;
use uuid::Uuid;

/// 基于HashMap的内存Blob存储
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<Uuid, (Vec<u8>, BlobMetadata)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前存储的Blob数量
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, data: &[u8], metadata: BlobMetadata) -> Result<Uuid> {
        let blob_id = Uuid::new_v4();
        self.blobs
            .write()
            .await
            .insert(blob_id, (data.to_vec(), metadata));
        Ok(blob_id)
    }

    async fn get(&self, blob_id: Uuid) -> Result<(Vec<u8>, BlobMetadata)> {
        self.blobs
            .read()
            .await
            .get(&blob_id)
            .cloned()
            .ok_or_else(|| StrokeError::NotFound(format!("Blob {} not found", blob_id)))
    }

    async fn exists(&self, blob_id: Uuid) -> Result<bool> {
        Ok(self.blobs.read().await.contains_key(&blob_id))
    }

    async fn delete(&self, blob_id: Uuid) -> Result<()> {
        self.blobs.write().await.remove(&blob_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryBlobStore::new();
        let metadata = BlobMetadata {
            filename: "scan.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size: 3,
            uploaded_at: Utc::now(),
            consultation_id: Uuid::new_v4(),
        };

        let blob_id = store.put(b"abc", metadata).await.unwrap();
        let (data, meta) = store.get(blob_id).await.unwrap();
        assert_eq!(data, b"abc");
        assert_eq!(meta.filename, "scan.jpg");

        store.delete(blob_id).await.unwrap();
        assert!(!store.exists(blob_id).await.unwrap());
        // 重复删除静默成功
        store.delete(blob_id).await.unwrap();
    }
}
