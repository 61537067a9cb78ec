//! 摄取请求与响应装配类型

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use stroke_core::{Consultation, Diagnosis, ImageAnalysis, Patient};
use uuid::Uuid;

/// 创建会诊的请求
#[derive(Debug)]
pub struct NewConsultation {
    pub patient_id: String,
    pub date: String,
    pub notes: Option<String>,
    pub images: Vec<ImageUpload>,
}

/// 单张上传影像
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 会诊响应中的患者概要
///
/// 患者缺失时各字段取空/零默认值，不影响会诊本身的读取。
#[derive(Debug, Clone, Serialize, Default)]
pub struct PatientSummary {
    pub id: Option<Uuid>,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub smoker: bool,
    pub alcoholic: bool,
    pub hypertension: bool,
    pub diabetes: bool,
    pub heart_disease: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Patient> for PatientSummary {
    fn from(patient: Patient) -> Self {
        Self {
            id: Some(patient.id),
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            smoker: patient.smoker,
            alcoholic: patient.alcoholic,
            hypertension: patient.hypertension,
            diabetes: patient.diabetes,
            heart_disease: patient.heart_disease,
            created_at: Some(patient.created_at),
        }
    }
}

/// 影像分析响应（blob_id即对外影像标识）
#[derive(Debug, Clone, Serialize)]
pub struct ImageAnalysisView {
    pub id: Uuid,
    pub filename: String,
    pub diagnosis: Diagnosis,
    pub confidence: f64,
    pub probability: f64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl ImageAnalysisView {
    pub fn new(analysis: &ImageAnalysis, base_url: &str) -> Self {
        Self {
            id: analysis.blob_id,
            filename: analysis.filename.clone(),
            diagnosis: analysis.diagnosis,
            confidence: analysis.confidence,
            probability: analysis.probability,
            url: format!(
                "{}/api/images/{}",
                base_url.trim_end_matches('/'),
                analysis.blob_id
            ),
            created_at: analysis.created_at,
        }
    }
}

/// 会诊响应（患者信息已联结）
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient: PatientSummary,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub diagnosis: Diagnosis,
    pub probability: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub images: Vec<ImageAnalysisView>,
}

impl ConsultationView {
    /// 由会诊文档、患者信息和影像视图装配响应
    pub fn assemble(
        consultation: &Consultation,
        patient: Option<Patient>,
        images: Vec<ImageAnalysisView>,
    ) -> Self {
        let summary = patient.map(PatientSummary::from).unwrap_or_default();
        Self {
            id: consultation.id,
            patient_id: consultation.patient_id,
            patient_name: summary.name.clone(),
            patient: summary,
            date: consultation.date,
            notes: consultation.notes.clone(),
            diagnosis: consultation.diagnosis,
            probability: consultation.probability,
            created_at: consultation.created_at,
            updated_at: consultation.updated_at,
            images,
        }
    }
}
