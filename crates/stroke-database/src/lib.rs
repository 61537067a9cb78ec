//! # Stroke Database
//!
//! 负责患者和会诊元数据的存储，提供文档级原子操作接口、
//! PostgreSQL实现和内存实现。影像分析列表内嵌于会诊文档，
//! 不设独立集合。

pub mod connection;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryMetadataStore;
pub use postgres::PgMetadataStore;
pub use store::{MetadataStore, PatientInput};
