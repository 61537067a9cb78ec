//! 内存元数据存储
//!
//! 用于测试和演示环境。与生产实现保持同一契约：
//! 单文档操作原子，更新/删除返回受影响的文档数。

use crate::store::{MetadataStore, PatientInput};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use stroke_core::{Consultation, Diagnosis, ImageAnalysis, Patient, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

/// 基于HashMap的内存元数据存储
#[derive(Default)]
pub struct MemoryMetadataStore {
    patients: RwLock<HashMap<Uuid, Patient>>,
    consultations: RwLock<HashMap<Uuid, Consultation>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入患者记录（测试夹具用）
    pub async fn seed_patient(&self, patient: Patient) {
        self.patients.write().await.insert(patient.id, patient);
    }

    /// 当前会诊文档数量
    pub async fn consultation_count(&self) -> usize {
        self.consultations.read().await.len()
    }
}

fn sorted_newest_first(mut consultations: Vec<Consultation>) -> Vec<Consultation> {
    consultations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    consultations
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert_patient(&self, input: &PatientInput) -> Result<Patient> {
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
        self.patients
            .write()
            .await
            .insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    async fn list_patients(&self) -> Result<Vec<Patient>> {
        let mut patients: Vec<_> = self.patients.read().await.values().cloned().collect();
        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(patients)
    }

    async fn update_patient(&self, id: Uuid, input: &PatientInput) -> Result<u64> {
        let mut patients = self.patients.write().await;
        match patients.get_mut(&id) {
            Some(patient) => {
                patient.name = input.name.clone();
                patient.age = input.age;
                patient.gender = input.gender.clone();
                patient.smoker = input.smoker;
                patient.alcoholic = input.alcoholic;
                patient.hypertension = input.hypertension;
                patient.diabetes = input.diabetes;
                patient.heart_disease = input.heart_disease;
                patient.updated_at = Some(Utc::now());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_patient(&self, id: Uuid) -> Result<u64> {
        Ok(self.patients.write().await.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_consultation(&self, consultation: &Consultation) -> Result<()> {
        self.consultations
            .write()
            .await
            .insert(consultation.id, consultation.clone());
        Ok(())
    }

    async fn find_consultation(&self, id: Uuid) -> Result<Option<Consultation>> {
        Ok(self.consultations.read().await.get(&id).cloned())
    }

    async fn list_consultations(&self, limit: i64, skip: i64) -> Result<Vec<Consultation>> {
        let consultations: Vec<_> = self.consultations.read().await.values().cloned().collect();
        Ok(sorted_newest_first(consultations)
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn finalize_consultation(
        &self,
        id: Uuid,
        diagnosis: Diagnosis,
        probability: f64,
        image_analyses: &[ImageAnalysis],
    ) -> Result<u64> {
        let mut consultations = self.consultations.write().await;
        match consultations.get_mut(&id) {
            Some(consultation) => {
                consultation.diagnosis = diagnosis;
                consultation.probability = probability;
                consultation.image_analyses = image_analyses.to_vec();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_consultation_details(
        &self,
        id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<u64> {
        let mut consultations = self.consultations.write().await;
        match consultations.get_mut(&id) {
            Some(consultation) => {
                consultation.patient_id = patient_id;
                consultation.date = date;
                consultation.notes = notes.map(str::to_string);
                consultation.updated_at = Some(Utc::now());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_consultation(&self, id: Uuid) -> Result<u64> {
        Ok(self
            .consultations
            .write()
            .await
            .remove(&id)
            .map_or(0, |_| 1))
    }

    async fn count_patients(&self) -> Result<i64> {
        Ok(self.patients.read().await.len() as i64)
    }

    async fn count_consultations(&self) -> Result<i64> {
        Ok(self.consultations.read().await.len() as i64)
    }

    async fn count_consultations_by_diagnosis(&self, diagnosis: Diagnosis) -> Result<i64> {
        Ok(self
            .consultations
            .read()
            .await
            .values()
            .filter(|c| c.diagnosis == diagnosis)
            .count() as i64)
    }

    async fn find_consultations_by_diagnosis(
        &self,
        diagnosis: Diagnosis,
    ) -> Result<Vec<Consultation>> {
        let matching: Vec<_> = self
            .consultations
            .read()
            .await
            .values()
            .filter(|c| c.diagnosis == diagnosis)
            .cloned()
            .collect();
        Ok(sorted_newest_first(matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input(name: &str) -> PatientInput {
        PatientInput {
            name: name.to_string(),
            age: 60,
            gender: "F".to_string(),
            smoker: false,
            alcoholic: false,
            hypertension: true,
            diabetes: false,
            heart_disease: false,
        }
    }

    fn sample_consultation(patient_id: Uuid) -> Consultation {
        Consultation {
            id: Uuid::new_v4(),
            patient_id,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            notes: None,
            diagnosis: Diagnosis::Processing,
            probability: 0.0,
            created_at: Utc::now(),
            updated_at: None,
            image_analyses: vec![],
        }
    }

    #[tokio::test]
    async fn test_patient_crud() {
        let store = MemoryMetadataStore::new();
        let patient = store.insert_patient(&sample_input("Ana")).await.unwrap();

        assert!(store.find_patient(patient.id).await.unwrap().is_some());
        assert_eq!(store.count_patients().await.unwrap(), 1);

        let mut updated = sample_input("Ana Maria");
        updated.age = 61;
        assert_eq!(store.update_patient(patient.id, &updated).await.unwrap(), 1);
        let found = store.find_patient(patient.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Ana Maria");
        assert!(found.updated_at.is_some());

        assert_eq!(store.delete_patient(patient.id).await.unwrap(), 1);
        assert_eq!(store.delete_patient(patient.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_finalize_reports_modified_count() {
        let store = MemoryMetadataStore::new();
        let consultation = sample_consultation(Uuid::new_v4());
        store.insert_consultation(&consultation).await.unwrap();

        let modified = store
            .finalize_consultation(consultation.id, Diagnosis::Normal, 0.2, &[])
            .await
            .unwrap();
        assert_eq!(modified, 1);

        // 不存在的文档返回0
        let modified = store
            .finalize_consultation(Uuid::new_v4(), Diagnosis::Normal, 0.2, &[])
            .await
            .unwrap();
        assert_eq!(modified, 0);
    }

    #[tokio::test]
    async fn test_list_consultations_newest_first() {
        let store = MemoryMetadataStore::new();
        let patient_id = Uuid::new_v4();

        let mut older = sample_consultation(patient_id);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let newer = sample_consultation(patient_id);

        store.insert_consultation(&older).await.unwrap();
        store.insert_consultation(&newer).await.unwrap();

        let listed = store.list_consultations(10, 0).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);

        let skipped = store.list_consultations(10, 1).await.unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].id, older.id);
    }
}
