// ==========================================
// 铝型材出货质量报告系统 - 工作簿读写
// ==========================================
// 读取: calamine (CPK 数据表 / 已生成报告的单元格值)
// 写出: umya-spreadsheet 打开模板, 只覆盖网格中的单元格
//       合并单元格 公式 样式 列宽 图片随模板保留
// ==========================================

use crate::engine::error::{ReportError, ReportResult};
use crate::report::grid::{CellValue, ReportGrid};
use calamine::{open_workbook_auto, Reader};
use std::path::{Path, PathBuf};
use tracing::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// CPK 数据表读取区域: AH..AT, 自第 11 行起
pub const CPK_FIRST_COLUMN: u32 = 34;
pub const CPK_LAST_COLUMN: u32 = 46;
pub const CPK_FIRST_ROW: u32 = 11;

const DEFAULT_SHEET_NAME: &str = "Sheet1";

// ==========================================
// ReportTemplate - 报告模板工作簿
// ==========================================
// 流程: open → fill (网格值覆盖到目标工作表) → save
pub struct ReportTemplate {
    path: PathBuf,
    book: Spreadsheet,
}

impl ReportTemplate {
    /// 打开模板; 文件不存在为 NotFound
    pub fn open(path: &Path) -> ReportResult<Self> {
        if !path.is_file() {
            return Err(ReportError::not_found("报告模板", path.display().to_string()));
        }

        let book = umya_spreadsheet::reader::xlsx::read(path)
            .map_err(|e| ReportError::Workbook(format!("模板读取失败 {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "模板加载完成");

        Ok(Self {
            path: path.to_path_buf(),
            book,
        })
    }

    /// 网格未指定工作表名时写入第一个工作表
    fn target_sheet(&mut self, sheet_name: &str) -> ReportResult<&mut Worksheet> {
        let sheet = if sheet_name.is_empty() {
            self.book.get_sheet_mut(&0)
        } else {
            self.book.get_sheet_by_name_mut(sheet_name)
        };
        let template = self.path.display().to_string();
        sheet.ok_or_else(|| {
            ReportError::Workbook(format!("模板无工作表 '{}': {}", sheet_name, template))
        })
    }

    /// 将网格中的单元格写入模板; 网格外的内容保持不变
    pub fn fill(&mut self, grid: &ReportGrid) -> ReportResult<()> {
        let sheet = self.target_sheet(grid.sheet_name())?;

        for (row, column, value) in grid.cells() {
            let cell = sheet.get_cell_mut((column, row));
            match value {
                CellValue::Text(text) => {
                    cell.set_value_string(text.clone());
                }
                CellValue::Number(n) => {
                    cell.set_value_number(*n);
                }
                CellValue::Bool(b) => {
                    cell.set_value_bool(*b);
                }
                CellValue::Empty => {}
            }
        }

        debug!(template = %self.path.display(), cells = grid.len(), "网格已写入模板");
        Ok(())
    }

    pub fn save(&self, path: &Path) -> ReportResult<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, path)
            .map_err(|e| ReportError::Workbook(format!("报告保存失败 {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "报告已保存");
        Ok(())
    }
}

/// 读取工作簿第一个工作表的单元格值
pub fn read_sheet(path: &Path) -> ReportResult<ReportGrid> {
    if !path.is_file() {
        return Err(ReportError::not_found("工作簿", path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::Workbook(format!("工作簿无工作表: {}", path.display())))??;

    let mut grid = ReportGrid::new(sheet_name);
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    for (r, c, cell) in range.cells() {
        let value = CellValue::from_data(cell);
        if !value.is_empty() {
            grid.set(start_row + r as u32 + 1, start_col + c as u32 + 1, value);
        }
    }
    Ok(grid)
}

/// 读取 CPK 数据表的固定区域 (行优先), 空单元格为 Empty
pub fn read_cpk_block(path: &Path, num_rows: usize) -> ReportResult<Vec<Vec<CellValue>>> {
    let sheet = read_sheet(path)?;

    let block = (0..num_rows as u32)
        .map(|offset| {
            let row = CPK_FIRST_ROW + offset;
            (CPK_FIRST_COLUMN..=CPK_LAST_COLUMN)
                .map(|col| sheet.get(row, col).cloned().unwrap_or(CellValue::Empty))
                .collect()
        })
        .collect();

    Ok(block)
}

/// 仅校验数据表可打开
pub fn open_check(path: &Path) -> ReportResult<()> {
    let mut workbook = open_workbook_auto(path)?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::Workbook(format!("数据表无工作表: {}", path.display())))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};
    use tempfile::tempdir;

    fn write_xlsx(path: &Path, sheet_name: &str, cells: &[(u32, u16, CellValue)]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name).unwrap();
        for (row, col, value) in cells {
            match value {
                CellValue::Text(t) => {
                    sheet.write_string(row - 1, col - 1, t).unwrap();
                }
                CellValue::Number(n) => {
                    sheet.write_number(row - 1, col - 1, *n).unwrap();
                }
                _ => {}
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_fill_overwrites_grid_cells_only() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("模板.xlsx");
        write_xlsx(
            &template,
            "报告",
            &[(1, 1, CellValue::text("出货检验报告")), (3, 14, CellValue::text("占位"))],
        );

        let mut grid = ReportGrid::default();
        grid.set(3, 14, "KAP-7457上U-A76-50");
        grid.set(4, 14, 350u64);

        let out = dir.path().join("报告.xlsx");
        let mut report = ReportTemplate::open(&template).unwrap();
        report.fill(&grid).unwrap();
        report.save(&out).unwrap();

        let saved = read_sheet(&out).unwrap();
        assert_eq!(saved.sheet_name(), "报告");
        assert_eq!(saved.get(1, 1), Some(&CellValue::text("出货检验报告")));
        assert_eq!(saved.get(3, 14), Some(&CellValue::text("KAP-7457上U-A76-50")));
        assert_eq!(saved.get(4, 14), Some(&CellValue::Number(350.0)));
    }

    #[test]
    fn test_fill_keeps_merged_range_and_formula() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("模板.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet
            .merge_range(0, 0, 0, 5, "出货检验报告", &Format::new().set_bold())
            .unwrap();
        sheet.write_formula(107, 11, "=SUM(I108:K108)").unwrap();
        workbook.save(&template).unwrap();

        let mut grid = ReportGrid::default();
        grid.set(108, 9, 29.5);
        let out = dir.path().join("报告.xlsx");
        let mut report = ReportTemplate::open(&template).unwrap();
        report.fill(&grid).unwrap();
        report.save(&out).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&out).unwrap();
        let sheet = book.get_sheet(&0).unwrap();
        assert_eq!(sheet.get_merge_cells().len(), 1);
        assert_eq!(sheet.get_merge_cells()[0].get_range(), "A1:F1");
        let formula = sheet.get_cell((12u32, 108u32)).unwrap().get_formula();
        assert_eq!(formula.trim_start_matches('='), "SUM(I108:K108)");
    }

    #[test]
    fn test_named_sheet_must_exist() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("模板.xlsx");
        write_xlsx(&template, "报告", &[(1, 1, CellValue::text("标题"))]);

        let mut report = ReportTemplate::open(&template).unwrap();
        let mut grid = ReportGrid::new("不存在");
        grid.set(1, 1, "x");
        assert!(matches!(report.fill(&grid), Err(ReportError::Workbook(_))));
    }

    #[test]
    fn test_cpk_block_reads_fixed_window() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cpk.xlsx");
        write_xlsx(
            &path,
            "CPK",
            &[
                (CPK_FIRST_ROW, CPK_FIRST_COLUMN as u16, CellValue::Number(1.5)),
                (CPK_FIRST_ROW + 1, CPK_LAST_COLUMN as u16, CellValue::Number(2.5)),
                (CPK_FIRST_ROW, CPK_LAST_COLUMN as u16 + 1, CellValue::Number(99.0)),
            ],
        );

        let block = read_cpk_block(&path, 3).unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(block[0].len(), 13);
        assert_eq!(block[0][0], CellValue::Number(1.5));
        assert_eq!(block[1][12], CellValue::Number(2.5));
        assert!(block[2].iter().all(CellValue::is_empty));
    }

    #[test]
    fn test_missing_template_is_not_found() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            ReportTemplate::open(&dir.path().join("none.xlsx")),
            Err(ReportError::NotFound { .. })
        ));
    }
}
