//! 核心数据模型定义

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 患者基本信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,      // 患者姓名
    pub age: i32,          // 年龄
    pub gender: String,    // 性别
    pub smoker: bool,      // 吸烟
    pub alcoholic: bool,   // 饮酒
    pub hypertension: bool, // 高血压
    pub diabetes: bool,    // 糖尿病
    pub heart_disease: bool, // 心脏病
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 诊断结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Diagnosis {
    Processing, // 分析中（仅在摄取请求生命周期内存在）
    Stroke,     // 脑卒中
    Normal,     // 正常
}

impl Diagnosis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Stroke => "Stroke",
            Self::Normal => "Normal",
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 会诊记录
///
/// 影像分析列表内嵌于会诊文档中，与会诊一同创建和删除，
/// 不存在独立的影像分析集合。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,          // 会诊日期
    pub notes: Option<String>,    // 备注
    pub diagnosis: Diagnosis,     // 综合诊断
    pub probability: f64,         // 各影像概率的算术平均值
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub image_analyses: Vec<ImageAnalysis>, // 按上传顺序排列
}

/// 单张影像的分析结果（内嵌于会诊文档）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub blob_id: Uuid,        // 影像在Blob存储中的ID，亦作为对外标识
    pub filename: String,     // 原始文件名
    pub diagnosis: Diagnosis, // 单张影像的诊断标签
    pub confidence: f64,      // 模型置信度 [0,1]
    pub probability: f64,     // 模型原始输出概率 [0,1]
    pub created_at: DateTime<Utc>,
}
