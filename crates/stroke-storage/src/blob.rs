//! Blob存储接口定义

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stroke_core::Result;
use uuid::Uuid;

/// Blob元数据
///
/// 每个Blob记录其所属会诊ID，用于删除时的交叉校验和清理。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub consultation_id: Uuid,
}

/// Blob存储接口
///
/// 实现必须保证单个Blob的写入和删除是原子的；
/// delete对不存在的Blob容错（不报错）。
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 存储Blob，返回分配的blob_id
    async fn put(&self, data: &[u8], metadata: BlobMetadata) -> Result<Uuid>;

    /// 读取Blob内容和元数据，不存在时返回NotFound
    async fn get(&self, blob_id: Uuid) -> Result<(Vec<u8>, BlobMetadata)>;

    /// 检查Blob是否存在
    async fn exists(&self, blob_id: Uuid) -> Result<bool>;

    /// 删除Blob，已不存在时静默成功
    async fn delete(&self, blob_id: Uuid) -> Result<()>;
}
