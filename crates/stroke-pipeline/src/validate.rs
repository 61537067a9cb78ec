//! 摄取输入校验
//!
//! 所有校验在任何写入发生之前完成；任一影像不合法则整个请求被拒绝。

use crate::types::ImageUpload;
use chrono::NaiveDate;
use stroke_core::{Result, StrokeError};

/// 单张影像大小上限（10 MiB）
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// 解析会诊日期，接受`YYYY-MM-DD`或带时间的ISO格式
pub fn parse_consultation_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StrokeError::InvalidInput("Date is required".to_string()));
    }
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| StrokeError::InvalidInput(format!("Invalid date: {}", raw)))
}

/// 校验整组上传影像
pub fn validate_images(images: &[ImageUpload]) -> Result<()> {
    if images.is_empty() {
        return Err(StrokeError::InvalidInput(
            "At least one image is required".to_string(),
        ));
    }

    for image in images {
        if image.filename.trim().is_empty() {
            return Err(StrokeError::InvalidInput(
                "All uploaded files must have filenames".to_string(),
            ));
        }
        if !image.content_type.starts_with("image/") {
            return Err(StrokeError::InvalidInput(format!(
                "File {} is not a valid image",
                image.filename
            )));
        }
        if image.bytes.is_empty() {
            return Err(StrokeError::InvalidInput(format!(
                "Image {} is empty",
                image.filename
            )));
        }
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(StrokeError::InvalidInput(format!(
                "Image {} is too large (max 10MB)",
                image.filename
            )));
        }
    }

    Ok(())
}

/// 规范化备注：空白字符串视为无备注
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.and_then(|n| {
        let trimmed = n.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(filename: &str, content_type: &str, bytes: Vec<u8>) -> ImageUpload {
        ImageUpload {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_consultation_date("2024-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        // 接受带时间的ISO格式
        assert_eq!(
            parse_consultation_date(" 2024-03-15T10:30:00 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_consultation_date("15/03/2024").is_err());
        assert!(parse_consultation_date("").is_err());
    }

    #[test]
    fn test_validate_images_accepts_valid_set() {
        let images = vec![
            image("a.png", "image/png", vec![1, 2, 3]),
            image("b.jpg", "image/jpeg", vec![4, 5]),
        ];
        assert!(validate_images(&images).is_ok());
    }

    #[test]
    fn test_validate_images_rejections() {
        assert!(validate_images(&[]).is_err());
        assert!(validate_images(&[image("", "image/png", vec![1])]).is_err());
        assert!(validate_images(&[image("doc.pdf", "application/pdf", vec![1])]).is_err());
        assert!(validate_images(&[image("a.png", "image/png", vec![])]).is_err());
        assert!(
            validate_images(&[image("a.png", "image/png", vec![0; MAX_IMAGE_BYTES + 1])]).is_err()
        );
    }

    #[test]
    fn test_whole_set_rejected_on_single_bad_image() {
        let images = vec![
            image("a.png", "image/png", vec![1]),
            image("doc.pdf", "application/pdf", vec![1]),
        ];
        assert!(validate_images(&images).is_err());
    }

    #[test]
    fn test_normalize_notes() {
        assert_eq!(normalize_notes(None), None);
        assert_eq!(normalize_notes(Some("   ".to_string())), None);
        assert_eq!(
            normalize_notes(Some("  headache  ".to_string())),
            Some("headache".to_string())
        );
    }
}
