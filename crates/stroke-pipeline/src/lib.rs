//! # Stroke Pipeline
//!
//! 会诊摄取流水线：校验输入、预留会诊文档、逐张影像分类并落盘、
//! 汇总综合诊断、最终化或回滚。同时提供会诊的读取装配、更新、
//! 删除和看板统计。

pub mod ingest;
pub mod stats;
pub mod types;
pub mod validate;

pub use ingest::IngestionPipeline;
pub use stats::{DashboardStats, MonthlyStat, RecentConsultation};
pub use types::{ConsultationView, ImageAnalysisView, ImageUpload, NewConsultation, PatientSummary};
