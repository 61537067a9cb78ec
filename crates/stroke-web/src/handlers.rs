//! HTTP处理器

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use stroke_core::utils::parse_record_id;
use stroke_core::StrokeError;
use stroke_database::PatientInput;
use stroke_pipeline::{ImageUpload, NewConsultation};
use tracing::info;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Stroke Detection API",
        "version": "1.0.0",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "api": "/api"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": "1.0.0"
    }))
}

// ========== 会诊相关处理器 ==========

/// 分页查询参数
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// 创建会诊（multipart表单：patient_id、date、notes、images）
pub async fn create_consultation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut patient_id: Option<String> = None;
    let mut date: Option<String> = None;
    let mut notes: Option<String> = None;
    let mut images: Vec<ImageUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StrokeError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "patient_id" => {
                patient_id = Some(field.text().await.map_err(|e| {
                    StrokeError::InvalidInput(format!("Invalid patient_id field: {}", e))
                })?);
            }
            "date" => {
                date = Some(field.text().await.map_err(|e| {
                    StrokeError::InvalidInput(format!("Invalid date field: {}", e))
                })?);
            }
            "notes" => {
                notes = Some(field.text().await.map_err(|e| {
                    StrokeError::InvalidInput(format!("Invalid notes field: {}", e))
                })?);
            }
            "images" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    StrokeError::InvalidInput(format!("Invalid image field: {}", e))
                })?;
                images.push(ImageUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {
                info!("Ignoring unknown multipart field: {}", name);
            }
        }
    }

    let patient_id = patient_id
        .ok_or_else(|| StrokeError::InvalidInput("Patient ID is required".to_string()))?;
    let date = date.ok_or_else(|| StrokeError::InvalidInput("Date is required".to_string()))?;

    info!(
        "Creating consultation - Patient ID: {}, Date: {}, Images: {}",
        patient_id,
        date,
        images.len()
    );

    let view = state
        .pipeline
        .create_consultation(NewConsultation {
            patient_id,
            date,
            notes,
            images,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// 会诊列表
pub async fn list_consultations(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let views = state
        .pipeline
        .list_consultations(params.limit.unwrap_or(100), params.skip.unwrap_or(0))
        .await?;
    Ok(Json(views))
}

/// 查询单个会诊
pub async fn get_consultation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let view = state.pipeline.get_consultation(&id).await?;
    Ok(Json(view))
}

/// 会诊更新表单（影像不可更新）
#[derive(Debug, Deserialize)]
pub struct ConsultationUpdateForm {
    pub patient_id: String,
    pub date: String,
    pub notes: Option<String>,
}

/// 更新会诊基本信息
pub async fn update_consultation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    axum::Form(form): axum::Form<ConsultationUpdateForm>,
) -> ApiResult<impl IntoResponse> {
    let view = state
        .pipeline
        .update_consultation(&id, &form.patient_id, &form.date, form.notes)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Consultation updated successfully",
        "data": view
    })))
}

/// 删除会诊及其关联影像
pub async fn delete_consultation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.pipeline.delete_consultation(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Consultation deleted successfully"
    })))
}

// ========== 患者相关处理器 ==========

fn validate_patient_input(input: &PatientInput) -> Result<(), ApiError> {
    if input.name.trim().len() < 2 {
        return Err(StrokeError::InvalidInput(
            "Patient name must be at least 2 characters".to_string(),
        )
        .into());
    }
    if input.age <= 0 || input.age >= 120 {
        return Err(StrokeError::InvalidInput("Patient age out of range".to_string()).into());
    }
    Ok(())
}

/// 患者列表
pub async fn list_patients(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let patients = state.pipeline.metadata_store().list_patients().await?;
    Ok(Json(json!({ "success": true, "data": patients })))
}

/// 创建患者
pub async fn create_patient(
    State(state): State<AppState>,
    Json(input): Json<PatientInput>,
) -> ApiResult<impl IntoResponse> {
    validate_patient_input(&input)?;
    let patient = state.pipeline.metadata_store().insert_patient(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": patient })),
    ))
}

/// 查询单个患者
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_record_id(&id)?;
    let patient = state
        .pipeline
        .metadata_store()
        .find_patient(id)
        .await?
        .ok_or_else(|| StrokeError::NotFound("Patient not found".to_string()))?;
    Ok(Json(json!({ "success": true, "data": patient })))
}

/// 更新患者信息
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PatientInput>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_record_id(&id)?;
    validate_patient_input(&input)?;

    let store = state.pipeline.metadata_store();
    let modified = store.update_patient(id, &input).await?;
    if modified == 0 {
        return Err(
            StrokeError::NotFound("Patient not found or no changes made".to_string()).into(),
        );
    }

    let patient = store
        .find_patient(id)
        .await?
        .ok_or_else(|| StrokeError::NotFound("Patient not found".to_string()))?;
    Ok(Json(json!({ "success": true, "data": patient })))
}

/// 删除患者
///
/// 会诊保留患者的非所有引用；已删除患者的会诊在读取端降级显示。
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let parsed = parse_record_id(&id)?;
    let deleted = state.pipeline.metadata_store().delete_patient(parsed).await?;
    if deleted == 0 {
        return Err(StrokeError::NotFound("Patient not found".to_string()).into());
    }
    Ok(Json(json!({ "success": true, "data": { "id": id } })))
}

// ========== 影像相关处理器 ==========

/// 读取影像原始内容
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let blob_id = parse_record_id(&id)?;
    let (data, metadata) = state.pipeline.blob_store().get(blob_id).await?;

    let response = (
        [
            (header::CONTENT_TYPE, metadata.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename={}", metadata.filename),
            ),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        data,
    );
    Ok(response.into_response())
}

// ========== 看板相关处理器 ==========

/// 看板统计
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let stats = state.pipeline.dashboard_stats().await?;
    Ok(Json(stats))
}
