//! 通用工具函数

use crate::{Result, StrokeError};
use uuid::Uuid;

/// 解析并校验记录ID格式
pub fn parse_record_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim())
        .map_err(|_| StrokeError::InvalidInput(format!("Invalid ID format: {}", id)))
}

/// 生成新的记录ID
pub fn generate_record_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_id() {
        let id = generate_record_id();
        assert_eq!(parse_record_id(&id.to_string()).unwrap(), id);
        // 允许首尾空白
        assert_eq!(parse_record_id(&format!("  {}  ", id)).unwrap(), id);
    }

    #[test]
    fn test_parse_record_id_invalid() {
        assert!(parse_record_id("not-a-uuid").is_err());
        assert!(parse_record_id("").is_err());
    }
}
