//! 数据库行模型与转换

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use stroke_core::{Consultation, Diagnosis, ImageAnalysis, Patient, Result, StrokeError};
use uuid::Uuid;

/// patients表行
#[derive(Debug, sqlx::FromRow)]
pub struct DbPatient {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub smoker: bool,
    pub alcoholic: bool,
    pub hypertension: bool,
    pub diabetes: bool,
    pub heart_disease: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<DbPatient> for Patient {
    fn from(row: DbPatient) -> Self {
        Patient {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
            smoker: row.smoker,
            alcoholic: row.alcoholic,
            hypertension: row.hypertension,
            diabetes: row.diabetes,
            heart_disease: row.heart_disease,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// consultations表行，影像分析列表以JSONB内嵌
#[derive(Debug, sqlx::FromRow)]
pub struct DbConsultation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub diagnosis: String,
    pub probability: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub image_analyses: Json<Vec<ImageAnalysis>>,
}

impl TryFrom<DbConsultation> for Consultation {
    type Error = StrokeError;

    fn try_from(row: DbConsultation) -> Result<Self> {
        Ok(Consultation {
            id: row.id,
            patient_id: row.patient_id,
            date: row.date,
            notes: row.notes,
            diagnosis: diagnosis_from_str(&row.diagnosis)?,
            probability: row.probability,
            created_at: row.created_at,
            updated_at: row.updated_at,
            image_analyses: row.image_analyses.0,
        })
    }
}

pub fn diagnosis_to_str(diagnosis: Diagnosis) -> &'static str {
    diagnosis.as_str()
}

pub fn diagnosis_from_str(value: &str) -> Result<Diagnosis> {
    match value {
        "Processing" => Ok(Diagnosis::Processing),
        "Stroke" => Ok(Diagnosis::Stroke),
        "Normal" => Ok(Diagnosis::Normal),
        other => Err(StrokeError::Database(format!(
            "Unknown diagnosis value: {}",
            other
        ))),
    }
}
