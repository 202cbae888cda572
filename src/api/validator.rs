// ==========================================
// 智能垃圾桶车队 - 请求参数校验
// ==========================================
// 职责: 把原始请求字段转换为领域类型；不合法时在写入前拒绝
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::{BinStatus, BinType};
use chrono::{DateTime, NaiveDateTime, Utc};

/// 校验填充率 (0~100)
pub fn validate_fill_percentage(fill: i32) -> ApiResult<i32> {
    if (0..=100).contains(&fill) {
        Ok(fill)
    } else {
        Err(ApiError::ValidationError(format!(
            "current_fill_percentage 必须在 0~100 之间, 实际为 {}",
            fill
        )))
    }
}

/// 校验容量（正整数）
pub fn validate_capacity(capacity_liters: i32) -> ApiResult<i32> {
    if capacity_liters > 0 {
        Ok(capacity_liters)
    } else {
        Err(ApiError::ValidationError(format!(
            "capacity_liters 必须为正整数, 实际为 {}",
            capacity_liters
        )))
    }
}

/// 校验非空文本，返回去除首尾空白后的值
pub fn require_text(field: &str, value: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{} 不能为空", field)));
    }
    Ok(trimmed.to_string())
}

/// 可选文本：空白视为未提供
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 解析垃圾桶类型
pub fn parse_bin_type(raw: &str) -> ApiResult<BinType> {
    BinType::parse(raw)
        .ok_or_else(|| ApiError::ValidationError(format!("未知的垃圾桶类型: {}", raw)))
}

/// 解析垃圾桶状态
pub fn parse_bin_status(raw: &str) -> ApiResult<BinStatus> {
    BinStatus::parse(raw)
        .ok_or_else(|| ApiError::ValidationError(format!("未知的垃圾桶状态: {}", raw)))
}

/// 解析时间戳
///
/// 支持 RFC 3339（带时区）；不带时区的 `YYYY-MM-DDTHH:MM:SS[.f]` 按 UTC 处理。
pub fn parse_timestamp(raw: &str) -> ApiResult<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }

    Err(ApiError::ValidationError(format!("无法解析时间戳: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fill_range() {
        assert!(validate_fill_percentage(0).is_ok());
        assert!(validate_fill_percentage(100).is_ok());
        assert!(validate_fill_percentage(-1).unwrap_err().is_validation());
        assert!(validate_fill_percentage(101).unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!(parse_bin_type("Hazardous").unwrap(), BinType::Hazardous);
        assert!(parse_bin_type("glass").is_err());
        assert_eq!(parse_bin_status("needs_maintenance").unwrap(), BinStatus::NeedsMaintenance);
        assert!(parse_bin_status("overflowing").is_err());
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2026-03-01T08:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2026-03-01T09:30:00+01:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2026-03-01T08:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2026-03-01 08:30:00").unwrap(), expected);
        assert!(parse_timestamp("tomorrow morning").unwrap_err().is_validation());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  TRUCK-7 ")), Some("TRUCK-7".to_string()));
        assert_eq!(optional_text(Some("   ")), None);
        assert_eq!(optional_text(None), None);
    }
}
