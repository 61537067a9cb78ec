//! 元数据存储接口定义

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stroke_core::{Consultation, Diagnosis, ImageAnalysis, Patient, Result};
use uuid::Uuid;

/// 患者写入数据（创建和更新共用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInput {
    pub name: String,
    pub age: i32,
    pub gender: String,
    #[serde(default)]
    pub smoker: bool,
    #[serde(default)]
    pub alcoholic: bool,
    #[serde(default)]
    pub hypertension: bool,
    #[serde(default)]
    pub diabetes: bool,
    #[serde(default)]
    pub heart_disease: bool,
}

/// 元数据存储接口
///
/// 所有操作在单文档粒度上原子；更新和删除返回受影响的文档数，
/// 调用方据此判断操作是否命中。不提供多文档事务。
#[async_trait]
pub trait MetadataStore: Send + Sync {
    // ========== 患者相关操作 ==========

    /// 创建新患者，ID和创建时间由存储分配
    async fn insert_patient(&self, input: &PatientInput) -> Result<Patient>;

    /// 根据ID查找患者
    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>>;

    /// 获取全部患者，按创建时间倒序
    async fn list_patients(&self) -> Result<Vec<Patient>>;

    /// 更新患者信息，返回修改的文档数
    async fn update_patient(&self, id: Uuid, input: &PatientInput) -> Result<u64>;

    /// 删除患者，返回删除的文档数
    async fn delete_patient(&self, id: Uuid) -> Result<u64>;

    // ========== 会诊相关操作 ==========

    /// 插入会诊文档（含临时占位状态）
    async fn insert_consultation(&self, consultation: &Consultation) -> Result<()>;

    /// 根据ID查找会诊
    async fn find_consultation(&self, id: Uuid) -> Result<Option<Consultation>>;

    /// 分页获取会诊，按创建时间倒序
    async fn list_consultations(&self, limit: i64, skip: i64) -> Result<Vec<Consultation>>;

    /// 将占位会诊原子更新为最终结果，返回修改的文档数
    async fn finalize_consultation(
        &self,
        id: Uuid,
        diagnosis: Diagnosis,
        probability: f64,
        image_analyses: &[ImageAnalysis],
    ) -> Result<u64>;

    /// 更新会诊基本信息（不含影像），返回修改的文档数
    async fn update_consultation_details(
        &self,
        id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<u64>;

    /// 删除会诊文档，返回删除的文档数
    async fn delete_consultation(&self, id: Uuid) -> Result<u64>;

    // ========== 统计查询 ==========

    async fn count_patients(&self) -> Result<i64>;

    async fn count_consultations(&self) -> Result<i64>;

    async fn count_consultations_by_diagnosis(&self, diagnosis: Diagnosis) -> Result<i64>;

    /// 获取指定诊断的全部会诊（统计用）
    async fn find_consultations_by_diagnosis(
        &self,
        diagnosis: Diagnosis,
    ) -> Result<Vec<Consultation>>;
}
