// ==========================================
// 铝型材出货质量报告系统 - 报告网格
// ==========================================
// 职责: 报告工作表的内存表示 (稀疏, 行列均从 1 开始)
// 写入: 行优先, 从锚点开始先列后行递增
// ==========================================

use crate::config::CellAnchor;
use crate::importer::file_parser::cell_to_string;
use calamine::Data;
use std::collections::BTreeMap;
use std::fmt;

/// 单元格值; Empty 写入时清空单元格
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(t) => t.trim().is_empty(),
            _ => false,
        }
    }

    /// calamine 单元格 → CellValue (日期转为 YYYY-MM-DD 文本)
    pub fn from_data(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::String(s) if s.trim().is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(cell_to_string(other)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(CellValue::Text).unwrap_or(CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(t) => f.write_str(t),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Empty => Ok(()),
        }
    }
}

// ==========================================
// ReportGrid - 单工作表网格
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportGrid {
    sheet_name: String,
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl ReportGrid {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn get(&self, row: u32, column: u32) -> Option<&CellValue> {
        self.cells.get(&(row, column))
    }

    /// 写入单元格; 坐标为 0 时忽略
    pub fn set(&mut self, row: u32, column: u32, value: impl Into<CellValue>) {
        if row == 0 || column == 0 {
            return;
        }
        match value.into() {
            CellValue::Empty => {
                self.cells.remove(&(row, column));
            }
            v => {
                self.cells.insert((row, column), v);
            }
        }
    }

    pub fn set_at(&mut self, anchor: CellAnchor, value: impl Into<CellValue>) {
        self.set(anchor.row, anchor.column, value);
    }

    /// 行优先写入二维块
    pub fn write_block(&mut self, anchor: CellAnchor, rows: &[Vec<CellValue>]) {
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                self.set(anchor.row + r as u32, anchor.column + c as u32, value.clone());
            }
        }
    }

    /// 沿行方向写入
    pub fn write_row(&mut self, anchor: CellAnchor, values: &[CellValue]) {
        for (c, value) in values.iter().enumerate() {
            self.set(anchor.row, anchor.column + c as u32, value.clone());
        }
    }

    /// 沿列方向写入
    pub fn write_column(&mut self, anchor: CellAnchor, values: &[CellValue]) {
        for (r, value) in values.iter().enumerate() {
            self.set(anchor.row + r as u32, anchor.column, value.clone());
        }
    }

    /// 按 (行, 列) 顺序遍历
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_block_is_row_major_from_anchor() {
        let mut grid = ReportGrid::new("Sheet1");
        grid.write_block(
            CellAnchor::new(12, 9),
            &[
                vec![CellValue::from(1.0), CellValue::from(2.0)],
                vec![CellValue::from(3.0), CellValue::Empty],
            ],
        );

        assert_eq!(grid.get(12, 9), Some(&CellValue::Number(1.0)));
        assert_eq!(grid.get(12, 10), Some(&CellValue::Number(2.0)));
        assert_eq!(grid.get(13, 9), Some(&CellValue::Number(3.0)));
        assert_eq!(grid.get(13, 10), None);
    }

    #[test]
    fn test_empty_clears_existing_cell() {
        let mut grid = ReportGrid::new("Sheet1");
        grid.set(1, 1, "模板占位");
        grid.set(1, 1, CellValue::Empty);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_zero_coordinates_ignored() {
        let mut grid = ReportGrid::new("Sheet1");
        grid.set(0, 3, "x");
        grid.set(3, 0, "x");
        assert_eq!(grid.len(), 0);
    }

    #[test]
    fn test_from_data_blank_string_is_empty() {
        assert_eq!(CellValue::from_data(&Data::String("  ".to_string())), CellValue::Empty);
        assert_eq!(CellValue::from_data(&Data::Int(7)), CellValue::Number(7.0));
    }
}
