//! 会诊摄取流水线
//!
//! 一次摄取是单个线性工作流：先全部校验，再插入占位会诊文档，
//! 随后按上传顺序逐张处理影像（分类→存Blob→累积分析记录），
//! 最后汇总并原子更新占位文档。任一步失败即回滚：尽力删除已写
//! 入的Blob和占位文档，并向调用方返回触发错误本身（回滚失败只
//! 记录日志，不替换原始错误）。

use crate::types::{ConsultationView, ImageAnalysisView, ImageUpload, NewConsultation};
use crate::validate::{normalize_notes, parse_consultation_date, validate_images};
use chrono::Utc;
use std::sync::Arc;
use stroke_core::utils::{generate_record_id, parse_record_id};
use stroke_core::{Consultation, Diagnosis, ImageAnalysis, Result, StrokeError};
use stroke_database::MetadataStore;
use stroke_model::{DecisionPolicy, Scorer};
use stroke_storage::{BlobMetadata, BlobStore};
use tracing::{error, info, warn};
use uuid::Uuid;

/// 会诊摄取流水线
///
/// 存储和模型句柄在应用启动时显式注入；流水线自身无全局状态，
/// 并发请求各自操作独立的占位文档，无需跨请求加锁。
pub struct IngestionPipeline {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    scorer: Arc<dyn Scorer>,
    policy: DecisionPolicy,
    base_url: String,
}

impl IngestionPipeline {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        scorer: Arc<dyn Scorer>,
        policy: DecisionPolicy,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            scorer,
            policy,
            base_url: base_url.into(),
        }
    }

    pub fn metadata_store(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn blob_store(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// 创建会诊并分析全部上传影像
    pub async fn create_consultation(&self, request: NewConsultation) -> Result<ConsultationView> {
        // 任何写入之前完成全部校验
        let patient_id = parse_record_id(&request.patient_id)?;
        let date = parse_consultation_date(&request.date)?;
        validate_images(&request.images)?;

        let patient = self
            .metadata
            .find_patient(patient_id)
            .await?
            .ok_or_else(|| StrokeError::NotFound("Patient not found".to_string()))?;

        let notes = normalize_notes(request.notes);

        // 先插入占位文档，获得稳定的会诊ID供影像元数据引用，
        // 也作为部分失败时唯一的可删除锚点
        let consultation = Consultation {
            id: generate_record_id(),
            patient_id,
            date,
            notes,
            diagnosis: Diagnosis::Processing,
            probability: 0.0,
            created_at: Utc::now(),
            updated_at: None,
            image_analyses: Vec::new(),
        };
        self.metadata.insert_consultation(&consultation).await?;
        info!("Created provisional consultation {}", consultation.id);

        // 按上传顺序串行处理（顺序参与展示，模型为单实例资源）
        let total = request.images.len();
        let mut analyses: Vec<ImageAnalysis> = Vec::with_capacity(total);
        for (index, image) in request.images.iter().enumerate() {
            info!(
                "Processing image {}/{}: {}",
                index + 1,
                total,
                image.filename
            );
            match self.process_image(consultation.id, image).await {
                Ok(analysis) => analyses.push(analysis),
                Err(e) => {
                    error!(
                        "Error processing image {} for consultation {}: {}",
                        image.filename, consultation.id, e
                    );
                    self.rollback(consultation.id, &analyses).await;
                    return Err(e);
                }
            }
        }

        // 汇总：概率取算术平均，综合诊断按同一阈值判定
        let probability =
            analyses.iter().map(|a| a.probability).sum::<f64>() / analyses.len() as f64;
        let diagnosis = self.policy.label(probability);
        info!(
            "Final diagnosis for consultation {}: {} (probability: {:.4})",
            consultation.id, diagnosis, probability
        );

        let modified = match self
            .metadata
            .finalize_consultation(consultation.id, diagnosis, probability, &analyses)
            .await
        {
            Ok(modified) => modified,
            Err(e) => {
                self.rollback(consultation.id, &analyses).await;
                return Err(e);
            }
        };
        if modified == 0 {
            self.rollback(consultation.id, &analyses).await;
            return Err(StrokeError::Database(
                "Failed to update consultation with results".to_string(),
            ));
        }

        let images = analyses
            .iter()
            .map(|a| ImageAnalysisView::new(a, &self.base_url))
            .collect();
        let finalized = Consultation {
            diagnosis,
            probability,
            image_analyses: analyses,
            ..consultation
        };
        Ok(ConsultationView::assemble(
            &finalized,
            Some(patient),
            images,
        ))
    }

    /// 处理单张影像：分类、落盘、生成分析记录
    async fn process_image(
        &self,
        consultation_id: Uuid,
        image: &ImageUpload,
    ) -> Result<ImageAnalysis> {
        let prediction = self.scorer.classify(&image.bytes).await?;

        let uploaded_at = Utc::now();
        let blob_id = self
            .blobs
            .put(
                &image.bytes,
                BlobMetadata {
                    filename: image.filename.clone(),
                    content_type: image.content_type.clone(),
                    size: image.bytes.len() as u64,
                    uploaded_at,
                    consultation_id,
                },
            )
            .await?;

        Ok(ImageAnalysis {
            blob_id,
            filename: image.filename.clone(),
            diagnosis: self.policy.label(prediction.probability),
            confidence: prediction.confidence,
            probability: prediction.probability,
            created_at: uploaded_at,
        })
    }

    /// 回滚占位会诊：尽力删除已写入的Blob和占位文档。
    /// 删除失败只记录日志（意味着存在需带外清理的孤儿数据），
    /// 不改变向调用方返回的原始错误。
    async fn rollback(&self, consultation_id: Uuid, analyses: &[ImageAnalysis]) {
        for analysis in analyses {
            if let Err(e) = self.blobs.delete(analysis.blob_id).await {
                error!(
                    "Rollback failed to delete blob {} for consultation {}: {}",
                    analysis.blob_id, consultation_id, e
                );
            }
        }
        match self.metadata.delete_consultation(consultation_id).await {
            Ok(_) => info!("Rolled back provisional consultation {}", consultation_id),
            Err(e) => error!(
                "Rollback failed to delete provisional consultation {}: {}",
                consultation_id, e
            ),
        }
    }

    /// 读取并装配单个会诊
    pub async fn get_consultation(&self, consultation_id: &str) -> Result<ConsultationView> {
        let id = parse_record_id(consultation_id)?;
        let consultation = self
            .metadata
            .find_consultation(id)
            .await?
            .ok_or_else(|| StrokeError::NotFound("Consultation not found".to_string()))?;

        let patient = self.metadata.find_patient(consultation.patient_id).await?;
        let images = self.accessible_images(&consultation).await;
        Ok(ConsultationView::assemble(&consultation, patient, images))
    }

    /// 分页读取会诊列表（按创建时间倒序），负的分页参数按0处理
    pub async fn list_consultations(&self, limit: i64, skip: i64) -> Result<Vec<ConsultationView>> {
        let consultations = self
            .metadata
            .list_consultations(limit.max(0), skip.max(0))
            .await?;

        let mut views = Vec::with_capacity(consultations.len());
        for consultation in &consultations {
            let patient = self.metadata.find_patient(consultation.patient_id).await?;
            let images = self.accessible_images(consultation).await;
            views.push(ConsultationView::assemble(consultation, patient, images));
        }
        Ok(views)
    }

    /// 过滤出Blob仍可访问的影像视图。
    /// Blob存储与元数据最终一致：单张影像不可访问只降级处理，
    /// 不影响整个会诊的读取。
    async fn accessible_images(&self, consultation: &Consultation) -> Vec<ImageAnalysisView> {
        let mut images = Vec::with_capacity(consultation.image_analyses.len());
        for analysis in &consultation.image_analyses {
            match self.blobs.exists(analysis.blob_id).await {
                Ok(true) => images.push(ImageAnalysisView::new(analysis, &self.base_url)),
                Ok(false) => warn!(
                    "Image {} of consultation {} not accessible",
                    analysis.blob_id, consultation.id
                ),
                Err(e) => warn!(
                    "Image {} of consultation {} not accessible: {}",
                    analysis.blob_id, consultation.id, e
                ),
            }
        }
        images
    }

    /// 更新会诊基本信息（影像不可更新）
    pub async fn update_consultation(
        &self,
        consultation_id: &str,
        patient_id: &str,
        date: &str,
        notes: Option<String>,
    ) -> Result<ConsultationView> {
        let id = parse_record_id(consultation_id)?;
        let patient_id = parse_record_id(patient_id)?;
        let date = parse_consultation_date(date)?;
        let notes = normalize_notes(notes);

        self.metadata
            .find_consultation(id)
            .await?
            .ok_or_else(|| StrokeError::NotFound("Consultation not found".to_string()))?;
        let patient = self
            .metadata
            .find_patient(patient_id)
            .await?
            .ok_or_else(|| StrokeError::NotFound("Patient not found".to_string()))?;

        let modified = self
            .metadata
            .update_consultation_details(id, patient_id, date, notes.as_deref())
            .await?;
        if modified == 0 {
            return Err(StrokeError::NotFound(
                "Consultation not found or no changes made".to_string(),
            ));
        }

        let updated = self
            .metadata
            .find_consultation(id)
            .await?
            .ok_or_else(|| StrokeError::NotFound("Consultation not found".to_string()))?;
        let images = self.accessible_images(&updated).await;
        Ok(ConsultationView::assemble(&updated, Some(patient), images))
    }

    /// 删除会诊及其关联影像
    ///
    /// Blob删除逐个尽力执行，失败记录日志后继续（与摄取回滚语义
    /// 一致）；成功返回后会诊文档必然已删除。
    pub async fn delete_consultation(&self, consultation_id: &str) -> Result<()> {
        let id = parse_record_id(consultation_id)?;
        let consultation = self
            .metadata
            .find_consultation(id)
            .await?
            .ok_or_else(|| StrokeError::NotFound("Consultation not found".to_string()))?;

        for analysis in &consultation.image_analyses {
            match self.blobs.delete(analysis.blob_id).await {
                Ok(()) => info!("Deleted image {} of consultation {}", analysis.blob_id, id),
                Err(e) => error!(
                    "Error deleting image {} of consultation {}: {}",
                    analysis.blob_id, id, e
                ),
            }
        }

        let deleted = self.metadata.delete_consultation(id).await?;
        if deleted == 0 {
            return Err(StrokeError::NotFound(
                "Consultation not found".to_string(),
            ));
        }
        info!("Deleted consultation {}", id);
        Ok(())
    }
}
