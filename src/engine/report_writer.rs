// ==========================================
// 铝型材出货质量报告系统 - 报告网格写入
// ==========================================
// 职责: 表头 / CPK 区域 / 性能区域 / 成分列 / 随机重量 → 绝对坐标
// 坐标: 1 起始, 由型号布局配置提供锚点
// ==========================================

use crate::config::{ModelCodeLayout, ReportConfig};
use crate::domain::{CompositionLimit, CompositionRow, ShipmentBatchRecord};
use crate::engine::error::{ReportError, ReportResult};
use crate::engine::functional_grid::Grid;
use crate::importer::field_mapper::round_to;
use crate::report::grid::{CellValue, ReportGrid};
use chrono::{Datelike, NaiveDate};
use rand::Rng;

/// 随机重量样本数
pub const WEIGHT_SAMPLES: usize = 3;
/// 成分写入保留小数位
const COMPOSITION_DECIMALS: i32 = 4;

// ==========================================
// 纯函数
// ==========================================

/// 抽样数量阶梯表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SamplePlan {
    Insufficient,
    FullInspection,
    Pieces(u32),
}

impl SamplePlan {
    fn for_quantity(batch_quantity: u64) -> Self {
        match batch_quantity {
            0..=1 => SamplePlan::Insufficient,
            2..=32 => SamplePlan::FullInspection,
            33..=500 => SamplePlan::Pieces(32),
            501..=3200 => SamplePlan::Pieces(125),
            3201..=10000 => SamplePlan::Pieces(200),
            10001..=35000 => SamplePlan::Pieces(315),
            35001..=150000 => SamplePlan::Pieces(500),
            150001..=500000 => SamplePlan::Pieces(800),
            _ => SamplePlan::Pieces(1250),
        }
    }

    fn label(self) -> String {
        match self {
            SamplePlan::Insufficient => "不够数量".to_string(),
            SamplePlan::FullInspection => "全检".to_string(),
            SamplePlan::Pieces(n) => format!("{} pcs", n),
        }
    }
}

/// 报告抽样数量单元格文本
pub fn sample_size(batch_quantity: u64) -> String {
    SamplePlan::for_quantity(batch_quantity).label()
}

/// 发货日期: YYYY-MM-DD 或 YYYY/MM/DD → Y/M/D (无前导 0)
pub fn format_shipment_date(raw: &str) -> ReportResult<String> {
    let normalized = raw.trim().replace('-', "/");
    let date = NaiveDate::parse_from_str(&normalized, "%Y/%m/%d").map_err(|_| {
        ReportError::ParseFailure {
            field: "发货日期".to_string(),
            value: raw.to_string(),
        }
    })?;
    Ok(format!("{}/{}/{}", date.year(), date.month(), date.day()))
}

/// 随机重量 (单位 0.1g 的整数区间, 含上下限)
pub fn generate_random_weights<R: Rng + ?Sized>(rng: &mut R, lower: u32, upper: u32) -> Vec<String> {
    (0..WEIGHT_SAMPLES)
        .map(|_| {
            let tenths = rng.gen_range(lower..=upper);
            format!("{}.{}g", tenths / 10, tenths % 10)
        })
        .collect()
}

/// 报告文件名 (含扩展名)
pub fn report_filename(record: &ShipmentBatchRecord, total_quantity: u64, project_tag: &str) -> String {
    format!(
        "{}{} {} {} {} ({}) {} {}.xlsx",
        record.customer,
        project_tag,
        record.model_code,
        record.customer_part_code,
        total_quantity,
        record.location,
        record.casting_furnace_code,
        record.extrusion_batch_code
    )
}

/// 数值文本写为数字, 其余写为文本
fn measurement_cell(value: &Option<String>) -> CellValue {
    match value {
        None => CellValue::Empty,
        Some(text) => text
            .trim()
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::text(text.as_str())),
    }
}

// ==========================================
// ReportGridWriter
// ==========================================
pub struct ReportGridWriter<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportGridWriter<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// 表头: 型号/发货日期/图号/炉号/发货数/客户料号/品名/抽样数量
    pub fn write_header(
        &self,
        grid: &mut ReportGrid,
        record: &ShipmentBatchRecord,
        layout: &ModelCodeLayout,
        total_quantity: u64,
    ) -> ReportResult<()> {
        let cells = &self.config.header_cells;
        let shipment_date = format_shipment_date(&record.shipment_date)?;

        grid.set_at(cells.model_code, record.model_code.as_str());
        grid.set_at(cells.shipment_date, shipment_date);
        grid.set_at(cells.schema_code, layout.schema_code.as_str());
        grid.set_at(cells.furnace_code, record.casting_furnace_code.as_str());
        grid.set_at(cells.total_quantity, total_quantity);
        grid.set_at(cells.customer_part_code, layout.customer_part_code.as_str());
        grid.set_at(cells.part_name, layout.part_name.as_str());
        grid.set_at(cells.sample_size, sample_size(total_quantity));
        Ok(())
    }

    pub fn write_cpk(&self, grid: &mut ReportGrid, layout: &ModelCodeLayout, block: &[Vec<CellValue>]) {
        grid.write_block(layout.cpk.anchor, block);
    }

    pub fn write_functional(&self, grid: &mut ReportGrid, layout: &ModelCodeLayout, block: &Grid) {
        let cells: Vec<Vec<CellValue>> = block
            .iter()
            .map(|row| row.iter().map(measurement_cell).collect())
            .collect();
        grid.write_block(layout.functional_anchor, &cells);
    }

    /// 成分列: 按上下限表顺序, 四舍五入 4 位; 缺失元素写空
    pub fn write_composition(
        &self,
        grid: &mut ReportGrid,
        layout: &ModelCodeLayout,
        composition: &CompositionRow,
        limits: &[CompositionLimit],
    ) {
        let values: Vec<CellValue> = limits
            .iter()
            .map(|limit| {
                composition
                    .element(&limit.element)
                    .map(|v| CellValue::Number(round_to(v, COMPOSITION_DECIMALS)))
                    .unwrap_or(CellValue::Empty)
            })
            .collect();
        grid.write_column(layout.composition_anchor, &values);
    }

    pub fn write_weights(&self, grid: &mut ReportGrid, layout: &ModelCodeLayout, weights: &[String]) {
        let values: Vec<CellValue> = weights.iter().map(|w| CellValue::text(w.as_str())).collect();
        grid.write_row(layout.weight.anchor, &values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    #[test]
    fn test_sample_size_breakpoints() {
        assert_eq!(sample_size(0), "不够数量");
        assert_eq!(sample_size(1), "不够数量");
        assert_eq!(sample_size(2), "全检");
        assert_eq!(sample_size(32), "全检");
        assert_eq!(sample_size(33), "32 pcs");
        assert_eq!(sample_size(500), "32 pcs");
        assert_eq!(sample_size(501), "125 pcs");
        assert_eq!(sample_size(3200), "125 pcs");
        assert_eq!(sample_size(10000), "200 pcs");
        assert_eq!(sample_size(35000), "315 pcs");
        assert_eq!(sample_size(150000), "500 pcs");
        assert_eq!(sample_size(500000), "800 pcs");
        assert_eq!(sample_size(500001), "1250 pcs");
    }

    #[test]
    fn test_sample_plan_outcomes() {
        assert_eq!(SamplePlan::for_quantity(1), SamplePlan::Insufficient);
        assert_eq!(SamplePlan::for_quantity(32), SamplePlan::FullInspection);
        assert_eq!(SamplePlan::for_quantity(33), SamplePlan::Pieces(32));
        assert_eq!(SamplePlan::for_quantity(u64::MAX), SamplePlan::Pieces(1250));
    }

    #[test]
    fn test_format_shipment_date() {
        assert_eq!(format_shipment_date("2025-07-08").unwrap(), "2025/7/8");
        assert_eq!(format_shipment_date("2025/12/31").unwrap(), "2025/12/31");
        assert!(matches!(
            format_shipment_date("08.07.2025"),
            Err(ReportError::ParseFailure { .. })
        ));
    }

    #[test]
    fn test_random_weights_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let weights = generate_random_weights(&mut rng, 291, 299);
            assert_eq!(weights.len(), WEIGHT_SAMPLES);
            for w in weights {
                let value: f64 = w.trim_end_matches('g').parse().unwrap();
                assert!((29.1..=29.9).contains(&value), "{}", w);
            }
        }
        let fixed = generate_random_weights(&mut rng, 290, 290);
        assert_eq!(fixed, vec!["29.0g", "29.0g", "29.0g"]);
    }

    #[test]
    fn test_report_filename() {
        let mut record = ShipmentBatchRecord::new(
            "HY",
            "无锡精密",
            "KAP-7457上U-A76-50",
            "F01",
            "K10123250708011",
            "A2507081",
        );
        record.customer_part_code = "18242741-00".to_string();
        assert_eq!(
            report_filename(&record, 350, "MANCHESTER"),
            "无锡精密MANCHESTER KAP-7457上U-A76-50 18242741-00 350 (HY) F01 K10123250708011.xlsx"
        );
    }

    #[test]
    fn test_composition_column_follows_limit_order() {
        let config = ReportConfig::default();
        let writer = ReportGridWriter::new(&config);
        let layout = config.layout("KAP-7457上U-A76-50").unwrap();

        let mut elements = BTreeMap::new();
        elements.insert("Zn".to_string(), 5.612345);
        elements.insert("Mg".to_string(), 1.2);
        let composition = CompositionRow {
            casting_furnace_code: "F01".to_string(),
            sample_type: "08".to_string(),
            elements,
        };
        let limits: Vec<CompositionLimit> = ["Mg", "Cu", "Zn"]
            .iter()
            .map(|e| CompositionLimit {
                element: e.to_string(),
                lower: 0.0,
                upper: 10.0,
            })
            .collect();

        let mut grid = ReportGrid::new("Sheet1");
        writer.write_composition(&mut grid, layout, &composition, &limits);

        assert_eq!(grid.get(81, 9), Some(&CellValue::Number(1.2)));
        assert_eq!(grid.get(82, 9), None);
        assert_eq!(grid.get(83, 9), Some(&CellValue::Number(5.6123)));
    }

    #[test]
    fn test_functional_block_numeric_cells() {
        let config = ReportConfig::default();
        let writer = ReportGridWriter::new(&config);
        let layout = config.layout("KAP-7461中板-A76-50").unwrap();

        let block: Grid = vec![vec![Some("151".to_string()), Some("合格".to_string()), None, None]];
        let mut grid = ReportGrid::new("Sheet1");
        writer.write_functional(&mut grid, layout, &block);

        assert_eq!(grid.get(70, 9), Some(&CellValue::Number(151.0)));
        assert_eq!(grid.get(70, 10), Some(&CellValue::text("合格")));
        assert_eq!(grid.get(70, 11), None);
    }
}
