// ==========================================
// 铝型材出货质量报告系统 - 字段映射器实现
// ==========================================
// 职责: 源字段 → 强类型行 + 类型转换
// 说明: 接口返回使用字段编码 (zbm/jyNo...), 上传文件使用中文标题, 统一按别名查找
// ==========================================

use crate::domain::{
    AgeingQrRow, CompositionLimit, CompositionRow, FunctionalPropertyRow, FunctionalRequirement,
    InspectionResult, ProcessCardQrRow, TestCommissionRow,
};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{RawRow, RowMapper};
use std::collections::BTreeMap;
use tracing::debug;

/// 性能数据中的测量值列
pub const MEASUREMENT_COLUMNS: [&str; 9] = [
    "硬度值",
    "电导率",
    "非比例延伸强度",
    "抗拉强度",
    "断后伸长率",
    "平均截距",
    "最大晶粒尺寸",
    "横纵比",
    "第二相尺寸",
];

/// 由 Mn 与 Cr 派生的成分列
pub const MN_CR_ELEMENT: &str = "Mn+Cr";

/// 流程卡时效批截取位数
pub const PROCESS_CARD_AGEING_CODE_LEN: usize = 8;

// ==========================================
// FieldMapper - 别名查找与类型转换
// ==========================================
pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }
}

impl FieldMapper {
    /// 提取字符串字段（空白/'-' 返回 None），支持多个可能的列名（别名）
    pub fn get_string(&self, row: &RawRow, key: &str) -> Option<String> {
        let aliases: &[&str] = match key {
            "客户/地区" => &["客户/地区", "zkhdq", "客户地区"],
            "发货数" => &["发货数", "zfhs"],
            "发货日期" => &["发货日期", "zfhrq"],
            "型号" => &["型号", "zbm"],
            "挤压批号" => &["挤压批号", "jy_no2", "jyNo"],
            "炉号" => &["炉号", "smelt_lot", "zlh", "process_lot"],
            "时效批号" => &["时效批号", "sx_no"],
            "生产挤压批" => &["生产挤压批", "jyPrd"],
            "铝棒炉号" => &["铝棒炉号", "smeltLot"],
            "挤压批" => &["挤压批", "jyCode"],
            "熔铸批号" => &["熔铸批号", "rzCode"],
            "时效批" => &["时效批", "sfc"],
            "二维码" => &["二维码", "qrcode"],
            "类型" => &["类型", "type"],
            _ => std::slice::from_ref(&key),
        };

        aliases
            .iter()
            .find_map(|alias| self.cleaner.normalize_null(row.get(*alias).map(String::as_str)))
    }

    /// 必填字段
    pub fn require(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<String> {
        self.get_string(row, key)
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: key.to_string(),
            })
    }

    pub fn parse_f64(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<Option<f64>> {
        let value = self.get_string(row, key);
        self.cleaner.parse_decimal(value.as_deref(), key, row_number)
    }

    pub fn parse_quantity(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<u64> {
        let value = self.get_string(row, key);
        self.cleaner.parse_quantity(value.as_deref(), key, row_number)
    }

    pub fn cleaner(&self) -> &DataCleaner {
        &self.cleaner
    }
}

// ==========================================
// 型材时效二维码
// ==========================================
#[derive(Default)]
pub struct AgeingQrMapper {
    fields: FieldMapper,
}

impl RowMapper for AgeingQrMapper {
    type Row = AgeingQrRow;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<AgeingQrRow>> {
        let f = &self.fields;
        Ok(Some(AgeingQrRow {
            model_code: f.require(row, "型号", row_number)?,
            extrusion_batch_code: f.require(row, "生产挤压批", row_number)?,
            casting_furnace_code: f.require(row, "铝棒炉号", row_number)?,
            extrusion_qr_code: f.get_string(row, "挤压批").unwrap_or_default(),
            smelting_batch_code: f.get_string(row, "熔铸批号").unwrap_or_default(),
        }))
    }
}

// ==========================================
// 流程卡二维码记录
// ==========================================
#[derive(Default)]
pub struct ProcessCardQrMapper {
    fields: FieldMapper,
}

impl RowMapper for ProcessCardQrMapper {
    type Row = ProcessCardQrRow;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<ProcessCardQrRow>> {
        let f = &self.fields;
        let ageing_batch = f.require(row, "时效批", row_number)?;
        Ok(Some(ProcessCardQrRow {
            model_code: f.require(row, "型号", row_number)?,
            extrusion_batch_code: f.require(row, "挤压批号", row_number)?,
            casting_furnace_code: f.require(row, "炉号", row_number)?,
            ageing_batch_code: f
                .cleaner()
                .truncate_chars(&ageing_batch, PROCESS_CARD_AGEING_CODE_LEN),
            qr_code: f.get_string(row, "二维码").unwrap_or_default(),
        }))
    }
}

// ==========================================
// 化学成分
// ==========================================
// 规则: 仅保留指定样品类型; 任一元素缺失的行丢弃; 派生 Mn+Cr
pub struct CompositionMapper<'a> {
    fields: FieldMapper,
    elements: &'a [String],
    sample_types: &'a [String],
}

impl<'a> CompositionMapper<'a> {
    pub fn new(elements: &'a [String], sample_types: &'a [String]) -> Self {
        Self {
            fields: FieldMapper::default(),
            elements,
            sample_types,
        }
    }
}

impl RowMapper for CompositionMapper<'_> {
    type Row = CompositionRow;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<CompositionRow>> {
        let f = &self.fields;

        let (Some(furnace), Some(sample_type)) = (f.get_string(row, "炉号"), f.get_string(row, "类型"))
        else {
            return Ok(None);
        };

        if !self.sample_types.iter().any(|t| t == &sample_type) {
            return Ok(None);
        }

        let mut elements = BTreeMap::new();
        for element in self.elements.iter().filter(|e| e.as_str() != MN_CR_ELEMENT) {
            match f.parse_f64(row, element, row_number)? {
                Some(value) => {
                    elements.insert(element.clone(), value);
                }
                None => {
                    debug!(row_number, furnace = %furnace, element = %element, "成分缺失, 丢弃该行");
                    return Ok(None);
                }
            }
        }

        if let (Some(mn), Some(cr)) = (elements.get("Mn").copied(), elements.get("Cr").copied()) {
            elements.insert(MN_CR_ELEMENT.to_string(), round_to(mn + cr, 5));
        }

        Ok(Some(CompositionRow {
            casting_furnace_code: furnace,
            sample_type,
            elements,
        }))
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Default)]
pub struct CompositionLimitMapper {
    fields: FieldMapper,
}

impl RowMapper for CompositionLimitMapper {
    type Row = CompositionLimit;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<CompositionLimit>> {
        let f = &self.fields;
        let element = f.require(row, "成分", row_number)?;
        let lower = f
            .parse_f64(row, "下限", row_number)?
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: "下限".to_string(),
            })?;
        let upper = f
            .parse_f64(row, "上限", row_number)?
            .ok_or_else(|| ImportError::MissingField {
                row: row_number,
                field: "上限".to_string(),
            })?;

        Ok(Some(CompositionLimit {
            element,
            lower,
            upper,
        }))
    }
}

// ==========================================
// 性能数据
// ==========================================
// 规则: 仅保留 OQC 留样编号内的样品
pub struct FunctionalPropertyMapper<'a> {
    fields: FieldMapper,
    sample_codes: &'a [String],
}

impl<'a> FunctionalPropertyMapper<'a> {
    pub fn new(sample_codes: &'a [String]) -> Self {
        Self {
            fields: FieldMapper::default(),
            sample_codes,
        }
    }
}

impl RowMapper for FunctionalPropertyMapper<'_> {
    type Row = FunctionalPropertyRow;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<FunctionalPropertyRow>> {
        let f = &self.fields;

        let Some(sample_code) = f.get_string(row, "oqc样号") else {
            return Ok(None);
        };
        if !self.sample_codes.iter().any(|c| c == &sample_code) {
            return Ok(None);
        }

        let measurements = MEASUREMENT_COLUMNS
            .iter()
            .filter_map(|column| f.get_string(row, column).map(|v| (column.to_string(), v)))
            .collect();

        Ok(Some(FunctionalPropertyRow {
            test_group: f.require(row, "检测项目", row_number)?,
            model_code: f.require(row, "型号", row_number)?,
            casting_furnace_code: f.get_string(row, "铝棒炉号").unwrap_or_default(),
            ageing_furnace_code: f.get_string(row, "时效炉号").unwrap_or_default(),
            sample_code,
            test_point: f.get_string(row, "点位"),
            measurements,
        }))
    }
}

// ==========================================
// 检测委托单
// ==========================================
#[derive(Default)]
pub struct TestCommissionMapper {
    fields: FieldMapper,
}

impl RowMapper for TestCommissionMapper {
    type Row = TestCommissionRow;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<TestCommissionRow>> {
        let f = &self.fields;
        Ok(Some(TestCommissionRow {
            commission_form_no: f.get_string(row, "委托单号").unwrap_or_default(),
            test_group: f.require(row, "检测项目", row_number)?,
            result: InspectionResult::parse(f.get_string(row, "检验结果").as_deref()),
            model_code: f.require(row, "型号", row_number)?,
            extrusion_batch_code: f.get_string(row, "挤压批次"),
            casting_furnace_code: f.get_string(row, "铝棒炉号"),
            ageing_furnace_code: f.get_string(row, "时效炉号"),
        }))
    }
}

// ==========================================
// 性能要求与点位
// ==========================================
#[derive(Default)]
pub struct RequirementMapper {
    fields: FieldMapper,
}

impl RowMapper for RequirementMapper {
    type Row = FunctionalRequirement;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<FunctionalRequirement>> {
        let f = &self.fields;
        Ok(Some(FunctionalRequirement {
            test_group: f.require(row, "检测项目", row_number)?,
            test_detail: f.require(row, "项目详细", row_number)?,
            test_point: f.get_string(row, "点位"),
        }))
    }
}
