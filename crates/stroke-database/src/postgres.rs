//! PostgreSQL元数据存储实现

use crate::connection::DatabasePool;
use crate::models::{diagnosis_to_str, DbConsultation, DbPatient};
use crate::store::{MetadataStore, PatientInput};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::Row;
use stroke_core::{Consultation, Diagnosis, ImageAnalysis, Patient, Result, StrokeError};
use uuid::Uuid;

/// 基于PostgreSQL的元数据存储
///
/// 会诊文档内嵌影像分析列表（JSONB列），单行写入即单文档原子操作。
/// 会诊到患者的引用不设外键约束：患者缺失时读取端降级处理。
pub struct PgMetadataStore {
    pool: DatabasePool,
}

impl PgMetadataStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        // 创建患者表
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patients (
                id UUID PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                age INTEGER NOT NULL,
                gender VARCHAR(16) NOT NULL,
                smoker BOOLEAN NOT NULL DEFAULT FALSE,
                alcoholic BOOLEAN NOT NULL DEFAULT FALSE,
                hypertension BOOLEAN NOT NULL DEFAULT FALSE,
                diabetes BOOLEAN NOT NULL DEFAULT FALSE,
                heart_disease BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE
            )
        "#,
        )
        .execute(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        // 创建会诊表
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS consultations (
                id UUID PRIMARY KEY,
                patient_id UUID NOT NULL,
                date DATE NOT NULL,
                notes TEXT,
                diagnosis VARCHAR(20) NOT NULL,
                probability DOUBLE PRECISION NOT NULL DEFAULT 0,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE,
                image_analyses JSONB NOT NULL DEFAULT '[]'
            )
        "#,
        )
        .execute(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        // 创建索引以优化查询性能
        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_consultations_patient_id ON consultations(patient_id)",
            "CREATE INDEX IF NOT EXISTS idx_consultations_created_at ON consultations(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_consultations_diagnosis ON consultations(diagnosis)",
        ];
        for index_sql in indexes {
            sqlx::query(index_sql)
                .execute(pool)
                .await
                .map_err(|e| StrokeError::Database(e.to_string()))?;
        }

        tracing::info!("Database tables created successfully");
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn insert_patient(&self, input: &PatientInput) -> Result<Patient> {
        let pool = self.pool.pool();
        let patient = Patient {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            age: input.age,
            gender: input.gender.clone(),
            smoker: input.smoker,
            alcoholic: input.alcoholic,
            hypertension: input.hypertension,
            diabetes: input.diabetes,
            heart_disease: input.heart_disease,
            created_at: Utc::now(),
            updated_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO patients (id, name, age, gender, smoker, alcoholic, hypertension, diabetes, heart_disease, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
        )
        .bind(patient.id)
        .bind(&patient.name)
        .bind(patient.age)
        .bind(&patient.gender)
        .bind(patient.smoker)
        .bind(patient.alcoholic)
        .bind(patient.hypertension)
        .bind(patient.diabetes)
        .bind(patient.heart_disease)
        .bind(patient.created_at)
        .execute(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(patient)
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        let pool = self.pool.pool();

        let result = sqlx::query_as::<_, DbPatient>("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(result.map(Patient::from))
    }

    async fn list_patients(&self) -> Result<Vec<Patient>> {
        let pool = self.pool.pool();

        let results =
            sqlx::query_as::<_, DbPatient>("SELECT * FROM patients ORDER BY created_at DESC")
                .fetch_all(pool)
                .await
                .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(results.into_iter().map(Patient::from).collect())
    }

    async fn update_patient(&self, id: Uuid, input: &PatientInput) -> Result<u64> {
        let pool = self.pool.pool();

        let result = sqlx::query(
            r#"
            UPDATE patients
            SET name = $1, age = $2, gender = $3, smoker = $4, alcoholic = $5,
                hypertension = $6, diabetes = $7, heart_disease = $8, updated_at = $9
            WHERE id = $10
        "#,
        )
        .bind(&input.name)
        .bind(input.age)
        .bind(&input.gender)
        .bind(input.smoker)
        .bind(input.alcoholic)
        .bind(input.hypertension)
        .bind(input.diabetes)
        .bind(input.heart_disease)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_patient(&self, id: Uuid) -> Result<u64> {
        let pool = self.pool.pool();

        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn insert_consultation(&self, consultation: &Consultation) -> Result<()> {
        let pool = self.pool.pool();

        sqlx::query(
            r#"
            INSERT INTO consultations (id, patient_id, date, notes, diagnosis, probability, created_at, image_analyses)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
        )
        .bind(consultation.id)
        .bind(consultation.patient_id)
        .bind(consultation.date)
        .bind(&consultation.notes)
        .bind(diagnosis_to_str(consultation.diagnosis))
        .bind(consultation.probability)
        .bind(consultation.created_at)
        .bind(Json(&consultation.image_analyses))
        .execute(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_consultation(&self, id: Uuid) -> Result<Option<Consultation>> {
        let pool = self.pool.pool();

        let result =
            sqlx::query_as::<_, DbConsultation>("SELECT * FROM consultations WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await
                .map_err(|e| StrokeError::Database(e.to_string()))?;

        result.map(Consultation::try_from).transpose()
    }

    async fn list_consultations(&self, limit: i64, skip: i64) -> Result<Vec<Consultation>> {
        let pool = self.pool.pool();

        // 与内存实现同契约：负的分页参数按0处理
        let results = sqlx::query_as::<_, DbConsultation>(
            "SELECT * FROM consultations ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit.max(0))
        .bind(skip.max(0))
        .fetch_all(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        results.into_iter().map(Consultation::try_from).collect()
    }

    async fn finalize_consultation(
        &self,
        id: Uuid,
        diagnosis: Diagnosis,
        probability: f64,
        image_analyses: &[ImageAnalysis],
    ) -> Result<u64> {
        let pool = self.pool.pool();

        let result = sqlx::query(
            r#"
            UPDATE consultations
            SET diagnosis = $1, probability = $2, image_analyses = $3
            WHERE id = $4
        "#,
        )
        .bind(diagnosis_to_str(diagnosis))
        .bind(probability)
        .bind(Json(image_analyses))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn update_consultation_details(
        &self,
        id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<u64> {
        let pool = self.pool.pool();

        let result = sqlx::query(
            r#"
            UPDATE consultations
            SET patient_id = $1, date = $2, notes = $3, updated_at = $4
            WHERE id = $5
        "#,
        )
        .bind(patient_id)
        .bind(date)
        .bind(notes)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_consultation(&self, id: Uuid) -> Result<u64> {
        let pool = self.pool.pool();

        let result = sqlx::query("DELETE FROM consultations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| StrokeError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count_patients(&self) -> Result<i64> {
        let pool = self.pool.pool();

        sqlx::query("SELECT COUNT(*) AS count FROM patients")
            .fetch_one(pool)
            .await
            .map(|row| row.get("count"))
            .map_err(|e| StrokeError::Database(e.to_string()))
    }

    async fn count_consultations(&self) -> Result<i64> {
        let pool = self.pool.pool();

        sqlx::query("SELECT COUNT(*) AS count FROM consultations")
            .fetch_one(pool)
            .await
            .map(|row| row.get("count"))
            .map_err(|e| StrokeError::Database(e.to_string()))
    }

    async fn count_consultations_by_diagnosis(&self, diagnosis: Diagnosis) -> Result<i64> {
        let pool = self.pool.pool();

        sqlx::query("SELECT COUNT(*) AS count FROM consultations WHERE diagnosis = $1")
            .bind(diagnosis_to_str(diagnosis))
            .fetch_one(pool)
            .await
            .map(|row| row.get("count"))
            .map_err(|e| StrokeError::Database(e.to_string()))
    }

    async fn find_consultations_by_diagnosis(
        &self,
        diagnosis: Diagnosis,
    ) -> Result<Vec<Consultation>> {
        let pool = self.pool.pool();

        let results = sqlx::query_as::<_, DbConsultation>(
            "SELECT * FROM consultations WHERE diagnosis = $1 ORDER BY created_at DESC",
        )
        .bind(diagnosis_to_str(diagnosis))
        .fetch_all(pool)
        .await
        .map_err(|e| StrokeError::Database(e.to_string()))?;

        results.into_iter().map(Consultation::try_from).collect()
    }
}
