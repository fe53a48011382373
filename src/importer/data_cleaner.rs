// ==========================================
// 铝型材出货质量报告系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 占位符 '-' 视为空
// ==========================================

use crate::importer::error::{ImportError, ImportResult};

/// 上游系统中表示"无数据"的占位符
pub const PLACEHOLDER_DASH: &str = "-";

pub struct DataCleaner;

impl DataCleaner {
    pub fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    /// 空白与 '-' 统一为 None
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() || trimmed == PLACEHOLDER_DASH {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析浮点数; 空值返回 None
    pub fn parse_decimal(
        &self,
        value: Option<&str>,
        field: &str,
        row: usize,
    ) -> ImportResult<Option<f64>> {
        match self.normalize_null(value) {
            None => Ok(None),
            Some(v) => v
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ImportError::TypeConversionError {
                    row,
                    field: field.to_string(),
                    message: format!("无法解析为浮点数: {}", v),
                }),
        }
    }

    /// 解析数量; 兼容 Excel 导出的 "120.0"
    pub fn parse_quantity(&self, value: Option<&str>, field: &str, row: usize) -> ImportResult<u64> {
        let text = self
            .normalize_null(value)
            .ok_or_else(|| ImportError::MissingField {
                row,
                field: field.to_string(),
            })?;

        if let Ok(n) = text.parse::<u64>() {
            return Ok(n);
        }

        match text.parse::<f64>() {
            Ok(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
            _ => Err(ImportError::TypeConversionError {
                row,
                field: field.to_string(),
                message: format!("无法解析为数量: {}", text),
            }),
        }
    }

    /// 按字符截取前 n 位
    pub fn truncate_chars(&self, value: &str, n: usize) -> String {
        value.chars().take(n).collect()
    }

    /// 按字符取后 n 位
    pub fn last_chars(&self, value: &str, n: usize) -> String {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(n)).collect()
    }

    /// 按字符去掉前 n 位
    pub fn skip_chars(&self, value: &str, n: usize) -> String {
        value.chars().skip(n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_null_handles_dash_and_blank() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some(" - ")), None);
        assert_eq!(cleaner.normalize_null(Some("   ")), None);
        assert_eq!(cleaner.normalize_null(None), None);
        assert_eq!(cleaner.normalize_null(Some(" F01 ")), Some("F01".to_string()));
    }

    #[test]
    fn test_parse_quantity_accepts_float_text() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_quantity(Some("120"), "发货数", 1).unwrap(), 120);
        assert_eq!(cleaner.parse_quantity(Some("120.0"), "发货数", 1).unwrap(), 120);
        assert!(cleaner.parse_quantity(Some("12.5"), "发货数", 1).is_err());
        assert!(matches!(
            cleaner.parse_quantity(None, "发货数", 3),
            Err(ImportError::MissingField { row: 3, .. })
        ));
    }

    #[test]
    fn test_char_helpers_are_utf8_safe() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.last_chars("二维码ABCD1234", 4), "1234");
        assert_eq!(cleaner.last_chars("AB", 4), "AB");
        assert_eq!(cleaner.skip_chars("ZZrest", 2), "rest");
        assert_eq!(cleaner.truncate_chars("A2507081-01", 8), "A2507081");
    }

    #[test]
    fn test_parse_decimal_reports_field() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_decimal(Some("-"), "Zn", 1).unwrap(), None);
        match cleaner.parse_decimal(Some("abc"), "Zn", 4) {
            Err(ImportError::TypeConversionError { row, field, .. }) => {
                assert_eq!(row, 4);
                assert_eq!(field, "Zn");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
