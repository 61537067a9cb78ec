//! 看板统计
//!
//! 在元数据存储的文档级查询之上在进程内汇总，
//! 不依赖特定数据库的聚合管道。

use crate::ingest::IngestionPipeline;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use stroke_core::{Diagnosis, Result};
use uuid::Uuid;

/// 单月脑卒中统计
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStat {
    pub year_month: String,
    pub stroke_count: i64,
    pub avg_probability: Option<f64>,
}

/// 最近会诊概要
#[derive(Debug, Clone, Serialize)]
pub struct RecentConsultation {
    pub id: Uuid,
    pub date: NaiveDate,
    pub diagnosis: Diagnosis,
    pub probability: f64,
    pub patient_name: String,
}

/// 看板统计数据
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: i64,
    pub total_consultations: i64,
    pub stroke_rate: String,
    pub avg_stroke_probability: String,
    pub avg_stroke_age: String,
    pub risk_age_range: String,
    pub monthly_stats: Vec<MonthlyStat>,
    pub recent_consultations: Vec<RecentConsultation>,
}

impl IngestionPipeline {
    /// 计算看板统计
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let metadata = self.metadata_store();

        let total_patients = metadata.count_patients().await?;
        let total_consultations = metadata.count_consultations().await?;
        let stroke_consultations = metadata
            .find_consultations_by_diagnosis(Diagnosis::Stroke)
            .await?;
        let stroke_count = stroke_consultations.len() as i64;

        let stroke_rate = if total_consultations > 0 {
            stroke_count as f64 / total_consultations as f64 * 100.0
        } else {
            0.0
        };

        let avg_stroke_probability = if stroke_count > 0 {
            stroke_consultations
                .iter()
                .map(|c| c.probability)
                .sum::<f64>()
                / stroke_count as f64
                * 100.0
        } else {
            0.0
        };

        // 脑卒中会诊对应患者的年龄分布
        let mut ages = Vec::new();
        for consultation in &stroke_consultations {
            if let Some(patient) = metadata.find_patient(consultation.patient_id).await? {
                ages.push(patient.age);
            }
        }
        let avg_stroke_age = if ages.is_empty() {
            0.0
        } else {
            ages.iter().map(|&a| a as f64).sum::<f64>() / ages.len() as f64
        };
        let risk_age_range = match (ages.iter().min(), ages.iter().max()) {
            (Some(min), Some(max)) => format!("{}-{}", min, max),
            _ => "0-0".to_string(),
        };

        // 按会诊日期的年月分桶，取最近6个月。
        // 没有Stroke的月份也要列出（stroke_count为0），
        // 因此对全部已定诊的会诊分桶，Stroke计数按条件累加。
        let normal_consultations = metadata
            .find_consultations_by_diagnosis(Diagnosis::Normal)
            .await?;
        let mut buckets: HashMap<String, (i64, f64)> = HashMap::new();
        for consultation in stroke_consultations.iter().chain(&normal_consultations) {
            let key = format!(
                "{:04}-{:02}",
                consultation.date.year(),
                consultation.date.month()
            );
            let entry = buckets.entry(key).or_insert((0, 0.0));
            if consultation.diagnosis == Diagnosis::Stroke {
                entry.0 += 1;
                entry.1 += consultation.probability;
            }
        }
        let mut monthly_stats: Vec<MonthlyStat> = buckets
            .into_iter()
            .map(|(year_month, (count, sum))| MonthlyStat {
                year_month,
                stroke_count: count,
                avg_probability: (count > 0).then(|| sum / count as f64),
            })
            .collect();
        monthly_stats.sort_by(|a, b| b.year_month.cmp(&a.year_month));
        monthly_stats.truncate(6);

        // 最近5次会诊（联结患者姓名）
        let mut recent_consultations = Vec::new();
        for consultation in metadata.list_consultations(5, 0).await? {
            let patient_name = metadata
                .find_patient(consultation.patient_id)
                .await?
                .map(|p| p.name)
                .unwrap_or_default();
            recent_consultations.push(RecentConsultation {
                id: consultation.id,
                date: consultation.date,
                diagnosis: consultation.diagnosis,
                probability: consultation.probability,
                patient_name,
            });
        }

        Ok(DashboardStats {
            total_patients,
            total_consultations,
            stroke_rate: format!("{:.1}", stroke_rate),
            avg_stroke_probability: format!("{:.2}", avg_stroke_probability),
            avg_stroke_age: format!("{:.1}", avg_stroke_age),
            risk_age_range,
            monthly_stats,
            recent_consultations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageUpload, NewConsultation};
    use std::sync::Arc;
    use stroke_database::{MemoryMetadataStore, MetadataStore, PatientInput};
    use stroke_model::{DecisionPolicy, FixedScorer};
    use stroke_storage::MemoryBlobStore;

    fn png(filename: &str) -> ImageUpload {
        ImageUpload {
            filename: filename.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    async fn ingest(
        pipeline: &IngestionPipeline,
        patient_id: &str,
        date: &str,
    ) -> crate::types::ConsultationView {
        pipeline
            .create_consultation(NewConsultation {
                patient_id: patient_id.to_string(),
                date: date.to_string(),
                notes: None,
                images: vec![png("scan.png")],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let metadata = Arc::new(MemoryMetadataStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());

        let patient = metadata
            .insert_patient(&PatientInput {
                name: "Luis Perez".to_string(),
                age: 70,
                gender: "M".to_string(),
                smoker: true,
                alcoholic: false,
                hypertension: true,
                diabetes: false,
                heart_disease: true,
            })
            .await
            .unwrap();

        // 两次Stroke（不同月份）加一次Normal
        let pipeline = IngestionPipeline::new(
            metadata.clone(),
            blobs,
            Arc::new(FixedScorer::with_probabilities(&[0.8, 0.6, 0.1])),
            DecisionPolicy::default(),
            "http://localhost:5000",
        );
        let patient_id = patient.id.to_string();
        ingest(&pipeline, &patient_id, "2024-03-10").await;
        ingest(&pipeline, &patient_id, "2024-04-02").await;
        ingest(&pipeline, &patient_id, "2024-04-20").await;

        let stats = pipeline.dashboard_stats().await.unwrap();

        assert_eq!(stats.total_patients, 1);
        assert_eq!(stats.total_consultations, 3);
        assert_eq!(stats.stroke_rate, "66.7");
        assert_eq!(stats.avg_stroke_probability, "70.00");
        assert_eq!(stats.avg_stroke_age, "70.0");
        assert_eq!(stats.risk_age_range, "70-70");

        assert_eq!(stats.monthly_stats.len(), 2);
        // 最近月份在前
        assert_eq!(stats.monthly_stats[0].year_month, "2024-04");
        assert_eq!(stats.monthly_stats[0].stroke_count, 1);
        assert_eq!(stats.monthly_stats[1].year_month, "2024-03");

        assert_eq!(stats.recent_consultations.len(), 3);
        assert_eq!(stats.recent_consultations[0].patient_name, "Luis Perez");
    }

    #[tokio::test]
    async fn test_monthly_stats_include_stroke_free_months() {
        let metadata = Arc::new(MemoryMetadataStore::new());
        let patient = metadata
            .insert_patient(&PatientInput {
                name: "Rosa Ibarra".to_string(),
                age: 58,
                gender: "F".to_string(),
                smoker: false,
                alcoholic: false,
                hypertension: false,
                diabetes: true,
                heart_disease: false,
            })
            .await
            .unwrap();

        // 三月一次Stroke，五月仅有Normal
        let pipeline = IngestionPipeline::new(
            metadata.clone(),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(FixedScorer::with_probabilities(&[0.9, 0.1])),
            DecisionPolicy::default(),
            "http://localhost:5000",
        );
        let patient_id = patient.id.to_string();
        ingest(&pipeline, &patient_id, "2024-03-10").await;
        ingest(&pipeline, &patient_id, "2024-05-05").await;

        let stats = pipeline.dashboard_stats().await.unwrap();

        assert_eq!(stats.monthly_stats.len(), 2);
        assert_eq!(stats.monthly_stats[0].year_month, "2024-05");
        assert_eq!(stats.monthly_stats[0].stroke_count, 0);
        assert!(stats.monthly_stats[0].avg_probability.is_none());
        assert_eq!(stats.monthly_stats[1].year_month, "2024-03");
        assert_eq!(stats.monthly_stats[1].stroke_count, 1);
    }

    #[tokio::test]
    async fn test_dashboard_stats_empty_store() {
        let pipeline = IngestionPipeline::new(
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(FixedScorer::with_probabilities(&[])),
            DecisionPolicy::default(),
            "http://localhost:5000",
        );

        let stats = pipeline.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_patients, 0);
        assert_eq!(stats.stroke_rate, "0.0");
        assert_eq!(stats.risk_age_range, "0-0");
        assert!(stats.monthly_stats.is_empty());
        assert!(stats.recent_consultations.is_empty());
    }
}
