// ==========================================
// 铝型材出货质量报告系统 - 发货批次派生
// ==========================================
// 职责: 发货原始行 → ShipmentBatchRecord (含派生字段)
// 派生: 地区/客户归一化, 挤压批号标准化, 模号, 时效炉, 图号/客户料号
// 排序: 地区 → 客户 → 型号(自定义顺序) → 炉号 → 发货数 → 挤压批号 → 时效批号
// ==========================================

use crate::config::ReportConfig;
use crate::domain::ShipmentBatchRecord;
use crate::engine::key_normalizer::{
    extract_ageing_furnace_code, extract_die_code, normalize_customer, normalize_location,
    transform_extrusion_batch_code,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::importer_trait::{RawRow, RowMapper};
use tracing::warn;

// ==========================================
// ShipmentRowMapper - 发货批次行映射
// ==========================================
pub struct ShipmentRowMapper<'a> {
    fields: FieldMapper,
    config: &'a ReportConfig,
    reference_year: i32,
}

impl<'a> ShipmentRowMapper<'a> {
    /// # 参数
    /// - config: 报告配置 (映射表/型号布局/固定值)
    /// - reference_year: 挤压批号补全使用的年份
    pub fn new(config: &'a ReportConfig, reference_year: i32) -> Self {
        Self {
            fields: FieldMapper::default(),
            config,
            reference_year,
        }
    }
}

impl RowMapper for ShipmentRowMapper<'_> {
    type Row = ShipmentBatchRecord;

    fn map_row(&self, row: &RawRow, row_number: usize) -> ImportResult<Option<ShipmentBatchRecord>> {
        let f = &self.fields;

        let customer_text = f.get_string(row, "客户/地区").unwrap_or_default();
        let model_code = f.require(row, "型号", row_number)?;
        let raw_extrusion = f.require(row, "挤压批号", row_number)?;
        let furnace = f.require(row, "炉号", row_number)?;
        let ageing = f.require(row, "时效批号", row_number)?;

        let extrusion = transform_extrusion_batch_code(&raw_extrusion, self.reference_year)
            .map_err(|_| ImportError::BatchCodeFormatError(raw_extrusion.clone()))?;

        let mut record = ShipmentBatchRecord::new(
            normalize_location(&customer_text, &self.config.location_mappings),
            normalize_customer(&customer_text, &self.config.customer_mappings),
            model_code,
            furnace,
            extrusion,
            ageing,
        );

        record.shipment_date = f.get_string(row, "发货日期").unwrap_or_default();
        record.batch_quantity = f.parse_quantity(row, "发货数", row_number)?;

        let defaults = &self.config.shipment_defaults;
        record.project = defaults.project.clone();
        record.alloy_code = defaults.alloy_code.clone();
        record.recycle_ratio = defaults.recycle_ratio.clone();

        match self.config.layout(&record.model_code) {
            Some(layout) => {
                record.schema_code = layout.schema_code.clone();
                record.customer_part_code = layout.customer_part_code.clone();
            }
            None => {
                warn!(row_number, model_code = %record.model_code, "型号未配置布局, 图号/客户料号留空");
            }
        }

        record.die_code = extract_die_code(&record.extrusion_batch_code);
        record.ageing_furnace_code = extract_ageing_furnace_code(&record.ageing_batch_code);
        record.customer_batch_code = f.get_string(row, "客户批号").unwrap_or_default();

        Ok(Some(record))
    }
}

/// 按业务顺序排序 (稳定排序)
pub fn sort_shipments(records: &mut [ShipmentBatchRecord], config: &ReportConfig) {
    records.sort_by(|a, b| {
        a.location
            .cmp(&b.location)
            .then_with(|| a.customer.cmp(&b.customer))
            .then_with(|| config.model_rank(&a.model_code).cmp(&config.model_rank(&b.model_code)))
            .then_with(|| a.casting_furnace_code.cmp(&b.casting_furnace_code))
            .then_with(|| a.batch_quantity.cmp(&b.batch_quantity))
            .then_with(|| a.extrusion_batch_code.cmp(&b.extrusion_batch_code))
            .then_with(|| a.ageing_batch_code.cmp(&b.ageing_batch_code))
    });
}

/// 映射并排序整张发货批次表
pub fn derive_shipments(
    rows: &[RawRow],
    config: &ReportConfig,
    reference_year: i32,
) -> ImportResult<Vec<ShipmentBatchRecord>> {
    let mut records = ShipmentRowMapper::new(config, reference_year).map_rows(rows)?;
    sort_shipments(&mut records, config);
    Ok(records)
}
