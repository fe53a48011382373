// ==========================================
// 铝型材出货质量报告系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv) / 接口 JSON (.json)
// 接口 JSON: { titleList: [{编码: 标题}], list: [{编码: 值}] }
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{FileParser, RawRow};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头 (去除 UTF-8 BOM)
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

/// 单元格转文本; 日期统一为 YYYY-MM-DD
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::DateTime(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))??;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

        let mut records = Vec::new();
        for data_row in rows {
            let mut row_map = HashMap::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), cell_to_string(cell));
                }
            }

            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// 接口 JSON Parser 实现
// ==========================================
// 行中同时保留 编码 与 标题 两个键, 便于按任一列名映射
pub struct PayloadParser;

impl PayloadParser {
    /// 解析接口返回体 (允许外层包一层 data)
    pub fn parse_payload(&self, body: &str) -> ImportResult<Vec<RawRow>> {
        let root: Value = serde_json::from_str(body)?;
        let payload = match root.get("data") {
            Some(inner) if inner.is_object() => inner,
            _ => &root,
        };

        let mut titles: HashMap<String, String> = HashMap::new();
        if let Some(title_list) = payload.get("titleList").and_then(Value::as_array) {
            for entry in title_list {
                if let Some(obj) = entry.as_object() {
                    for (code, title) in obj {
                        if let Some(title) = title.as_str() {
                            titles.insert(code.clone(), title.trim().to_string());
                        }
                    }
                }
            }
        }

        let list = payload
            .get("list")
            .and_then(Value::as_array)
            .ok_or_else(|| ImportError::PayloadParseError("缺少 list 字段".to_string()))?;

        let mut records = Vec::with_capacity(list.len());
        for item in list {
            let obj = item
                .as_object()
                .ok_or_else(|| ImportError::PayloadParseError("list 元素不是对象".to_string()))?;

            let mut row_map = HashMap::new();
            for (code, value) in obj {
                let text = json_value_to_string(value);
                if let Some(title) = titles.get(code) {
                    row_map.entry(title.clone()).or_insert_with(|| text.clone());
                }
                row_map.insert(code.clone(), text);
            }

            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }
            records.push(row_map);
        }

        Ok(records)
    }
}

fn json_value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

impl FileParser for PayloadParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;
        let body = std::fs::read_to_string(file_path)?;
        self.parse_payload(&body)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_to_raw_records(path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_records(path),
            "json" => PayloadParser.parse_to_raw_records(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
