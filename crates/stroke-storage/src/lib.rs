//! # Stroke Storage
//!
//! 负责影像原始数据（Blob）的存储和管理。

pub mod blob;
pub mod local;
pub mod memory;

pub use blob::{BlobMetadata, BlobStore};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
