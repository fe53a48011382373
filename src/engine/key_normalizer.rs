// ==========================================
// 铝型材出货质量报告系统 - 关键字归一化
// ==========================================
// 职责: 客户/地区文本 → 编码; 挤压批号 → 15 位标准编码
// 红线: 纯函数, 年份由调用方显式传入
// ==========================================

use crate::config::KeyMapping;
use crate::engine::error::ReportError;
use chrono::Datelike;
use std::collections::BTreeSet;

/// 地区未匹配
pub const UNASSIGNED_LOCATION: &str = "地区未录入";
/// 客户未匹配
pub const UNASSIGNED_CUSTOMER: &str = "客户未录入";

/// 标准挤压批号长度
pub const CANONICAL_BATCH_CODE_LEN: usize = 15;
const BATCH_CODE_SEPARATOR: char = '-';
const DIE_CODE_WIDTH: usize = 4;

/// 收集所有命中的编码, 返回字典序最小者
fn match_smallest_code(raw_text: &str, mappings: &[KeyMapping]) -> Option<String> {
    let matched: BTreeSet<&str> = mappings
        .iter()
        .filter(|m| raw_text.contains(m.pattern.as_str()))
        .map(|m| m.code.as_str())
        .collect();

    matched.into_iter().next().map(str::to_string)
}

pub fn normalize_location(raw_text: &str, mappings: &[KeyMapping]) -> String {
    match_smallest_code(raw_text, mappings).unwrap_or_else(|| UNASSIGNED_LOCATION.to_string())
}

pub fn normalize_customer(raw_text: &str, mappings: &[KeyMapping]) -> String {
    match_smallest_code(raw_text, mappings).unwrap_or_else(|| UNASSIGNED_CUSTOMER.to_string())
}

/// 挤压批号标准化
///
/// # 规则
/// - 不含 '-' 且长度为 15 → 原样返回
/// - 否则按 '-' 拆为 {前缀, 模号, 日期}: 模号左补 0 至 4 位, 日期前加年份后两位
///
/// # 示例
/// ```
/// use extrusion_qa_report::engine::key_normalizer::transform_extrusion_batch_code;
/// let code = transform_extrusion_batch_code("A-7-250101", 2026).unwrap();
/// assert_eq!(code, "A000726250101");
/// ```
pub fn transform_extrusion_batch_code(code: &str, reference_year: i32) -> Result<String, ReportError> {
    let code = code.trim();
    if !code.contains(BATCH_CODE_SEPARATOR) && code.chars().count() == CANONICAL_BATCH_CODE_LEN {
        return Ok(code.to_string());
    }

    let parts: Vec<&str> = code.split(BATCH_CODE_SEPARATOR).collect();
    if parts.len() < 3 {
        return Err(ReportError::ParseFailure {
            field: "挤压批号".to_string(),
            value: code.to_string(),
        });
    }

    let die_id = parts[0];
    let die_code = format!("{:0>width$}", parts[1], width = DIE_CODE_WIDTH);
    let year_suffix = format!("{:02}", reference_year.rem_euclid(100));

    Ok(format!("{}{}{}{}", die_id, die_code, year_suffix, parts[2]))
}

/// 使用当前日历年份的便捷版本
pub fn transform_extrusion_batch_code_now(code: &str) -> Result<String, ReportError> {
    transform_extrusion_batch_code(code, chrono::Local::now().year())
}

/// 从标准挤压批号取模号: 第 3~6 位, 去掉一个前导 0
pub fn extract_die_code(extrusion_batch_code: &str) -> String {
    let die_code: String = extrusion_batch_code.chars().skip(2).take(4).collect();
    match die_code.strip_prefix('0') {
        Some(rest) => rest.to_string(),
        None => die_code,
    }
}

/// 时效炉: 时效批号第 4~5 位
pub fn extract_ageing_furnace_code(ageing_batch_code: &str) -> String {
    ageing_batch_code.chars().skip(3).take(2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;

    #[test]
    fn test_canonical_code_is_identity() {
        let code = "A1012325070801X";
        assert_eq!(code.len(), 15);
        assert_eq!(transform_extrusion_batch_code(code, 2026).unwrap(), code);
        assert_eq!(transform_extrusion_batch_code(code, 1999).unwrap(), code);
    }

    #[test]
    fn test_composite_code_pads_die_code_and_prefixes_year() {
        let code = transform_extrusion_batch_code("A-7-250101", 2026).unwrap();
        assert!(code.starts_with('A'));
        assert_eq!(&code[1..5], "0007");
        assert_eq!(&code[5..7], "26");
        assert_eq!(&code[7..], "250101");
    }

    #[test]
    fn test_wide_die_code_is_not_padded() {
        let code = transform_extrusion_batch_code("K1-12345-0708011", 2025).unwrap();
        assert_eq!(code, "K112345250708011");
    }

    #[test]
    fn test_production_style_code_becomes_fifteen_chars() {
        let code = transform_extrusion_batch_code("K1-123-0708011", 2025).unwrap();
        assert_eq!(code, "K10123250708011");
        assert_eq!(code.len(), CANONICAL_BATCH_CODE_LEN);
    }

    #[test]
    fn test_malformed_code_is_parse_failure() {
        assert!(matches!(
            transform_extrusion_batch_code("ABC", 2026),
            Err(ReportError::ParseFailure { .. })
        ));
    }

    #[test]
    fn test_location_picks_smallest_code() {
        let config = ReportConfig::default();
        assert_eq!(normalize_location("华阳工厂", &config.location_mappings), "HY");
        // 同时命中 HY 与 LKS 时取字典序最小
        assert_eq!(normalize_location("华阳-LKS", &config.location_mappings), "HY");
        assert_eq!(normalize_location("朗克斯", &config.location_mappings), "LKS");
        assert_eq!(normalize_location("未知", &config.location_mappings), UNASSIGNED_LOCATION);
    }

    #[test]
    fn test_customer_mapping() {
        let config = ReportConfig::default();
        assert_eq!(normalize_customer("华阳EPZ", &config.customer_mappings), "无锡精密");
        assert_eq!(normalize_customer("比亚迪金属", &config.customer_mappings), "无锡比亚迪");
        assert_eq!(normalize_customer("", &config.customer_mappings), UNASSIGNED_CUSTOMER);
    }

    #[test]
    fn test_die_and_ageing_furnace_extraction() {
        assert_eq!(extract_die_code("K10123250708011"), "123");
        assert_eq!(extract_die_code("K11234250708011"), "1234");
        assert_eq!(extract_ageing_furnace_code("A25070801"), "07");
        assert_eq!(extract_ageing_furnace_code("AB"), "");
    }
}
