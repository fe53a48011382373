// ==========================================
// 铝型材出货质量报告系统 - 导入接口
// ==========================================
// 职责: 定义文件解析与行映射接口（不包含实现）
// 流程: 文件 → 原始行 (列名 → 值) → 强类型行
// ==========================================

use crate::importer::error::ImportResult;
use std::collections::HashMap;
use std::path::Path;

/// 原始行记录: 列名 → 值 (已 TRIM)
pub type RawRow = HashMap<String, String>;

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser, PayloadParser
pub trait FileParser {
    /// 解析文件为原始行记录
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 行记录列表 (完全空白的行已跳过)
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// RowMapper Trait
// ==========================================
// 用途: 原始行 → 参考表强类型行
// 返回 Ok(None) 表示该行按规则被过滤 (如非目标样品类型)
pub trait RowMapper {
    type Row;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<Self::Row>>;

    /// 逐行映射, 行号从 1 开始
    fn map_rows(&self, rows: &[RawRow]) -> ImportResult<Vec<Self::Row>> {
        let mut mapped = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            if let Some(record) = self.map_row(row, idx + 1)? {
                mapped.push(record);
            }
        }
        Ok(mapped)
    }
}
