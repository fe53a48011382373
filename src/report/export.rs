// ==========================================
// 铝型材出货质量报告系统 - 表格导出
// ==========================================
// 导出: 检查后的发货批次表 / 客户发货明细 (CSV)
// 统计: 报告文件夹内各型号发货数汇总
// ==========================================

use crate::config::ReportConfig;
use crate::domain::ShipmentBatchRecord;
use crate::engine::error::{ReportError, ReportResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

// ==========================================
// 发货批次表 (含检查状态)
// ==========================================
#[derive(Debug, Serialize)]
struct AnnotatedShipmentRow<'r> {
    #[serde(rename = "地区")]
    location: &'r str,
    #[serde(rename = "客户")]
    customer: &'r str,
    #[serde(rename = "项目")]
    project: &'r str,
    #[serde(rename = "发货数")]
    batch_quantity: u64,
    #[serde(rename = "发货日期")]
    shipment_date: &'r str,
    #[serde(rename = "型号")]
    model_code: &'r str,
    #[serde(rename = "图号")]
    schema_code: &'r str,
    #[serde(rename = "合金")]
    alloy_code: &'r str,
    #[serde(rename = "回收比")]
    recycle_ratio: &'r str,
    #[serde(rename = "挤压批号")]
    extrusion_batch_code: &'r str,
    #[serde(rename = "挤压批（二维码）")]
    extrusion_qr_full: String,
    #[serde(rename = "挤压批次二维码")]
    extrusion_qr_half: String,
    #[serde(rename = "模号")]
    die_code: &'r str,
    #[serde(rename = "炉号")]
    casting_furnace_code: &'r str,
    #[serde(rename = "熔铸批号")]
    smelting_batch_code: String,
    #[serde(rename = "时效批号")]
    ageing_batch_code: &'r str,
    #[serde(rename = "时效炉")]
    ageing_furnace_code: &'r str,
    #[serde(rename = "时效批次（二维码）")]
    ageing_batch_qr: String,
    #[serde(rename = "客户料号")]
    customer_part_code: &'r str,
    #[serde(rename = "客户批号")]
    customer_batch_code: &'r str,
    #[serde(rename = "CPK")]
    cpk_status: &'static str,
    #[serde(rename = "性能")]
    functional_status: String,
    #[serde(rename = "成分")]
    composition_status: &'static str,
}

impl<'r> From<&'r ShipmentBatchRecord> for AnnotatedShipmentRow<'r> {
    fn from(r: &'r ShipmentBatchRecord) -> Self {
        Self {
            location: &r.location,
            customer: &r.customer,
            project: &r.project,
            batch_quantity: r.batch_quantity,
            shipment_date: &r.shipment_date,
            model_code: &r.model_code,
            schema_code: &r.schema_code,
            alloy_code: &r.alloy_code,
            recycle_ratio: &r.recycle_ratio,
            extrusion_batch_code: &r.extrusion_batch_code,
            extrusion_qr_full: r.extrusion_qr_full.to_string(),
            extrusion_qr_half: r.extrusion_qr_half.to_string(),
            die_code: &r.die_code,
            casting_furnace_code: &r.casting_furnace_code,
            smelting_batch_code: r.smelting_batch_code.to_string(),
            ageing_batch_code: &r.ageing_batch_code,
            ageing_furnace_code: &r.ageing_furnace_code,
            ageing_batch_qr: r.ageing_batch_qr.to_string(),
            customer_part_code: &r.customer_part_code,
            customer_batch_code: &r.customer_batch_code,
            cpk_status: r.cpk_status.label(),
            functional_status: r.functional_status.to_string(),
            composition_status: r.composition_status.label(),
        }
    }
}

/// 导出检查后的发货批次表
pub fn write_shipments_csv(records: &[ShipmentBatchRecord], path: &Path) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(AnnotatedShipmentRow::from(record))?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = records.len(), "发货批次表已导出");
    Ok(())
}

// ==========================================
// 客户发货明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerShipmentDetail {
    #[serde(rename = "客户料号")]
    pub customer_part_code: String,
    #[serde(rename = "品名")]
    pub part_name: String,
    #[serde(rename = "发货日期")]
    pub shipment_date: String,
    #[serde(rename = "挤压批号")]
    pub extrusion_batch_code: String,
    #[serde(rename = "挤压批（二维码）")]
    pub extrusion_qr_full: String,
    #[serde(rename = "发货数")]
    pub batch_quantity: u64,
    #[serde(rename = "炉号")]
    pub casting_furnace_code: String,
    #[serde(rename = "熔铸批号")]
    pub smelting_batch_code: String,
    #[serde(rename = "型材厂商")]
    pub vendor: String,
    #[serde(rename = "Makeup")]
    pub makeup: String,
    #[serde(rename = "标签")]
    pub label: String,
    #[serde(rename = "阶段")]
    pub stage: String,
    #[serde(rename = "地区")]
    pub location: String,
    /// 客户英文代码; 未登记为空
    #[serde(rename = "客户")]
    pub customer_code: String,
}

pub fn customer_shipment_details(
    records: &[ShipmentBatchRecord],
    config: &ReportConfig,
) -> Vec<CustomerShipmentDetail> {
    let defaults = &config.customer_details;
    records
        .iter()
        .map(|r| CustomerShipmentDetail {
            customer_part_code: r.customer_part_code.clone(),
            part_name: config
                .layout(&r.model_code)
                .map(|l| l.part_name.clone())
                .unwrap_or_default(),
            shipment_date: r.shipment_date.clone(),
            extrusion_batch_code: r.extrusion_batch_code.clone(),
            extrusion_qr_full: r.extrusion_qr_full.to_string(),
            batch_quantity: r.batch_quantity,
            casting_furnace_code: r.casting_furnace_code.clone(),
            smelting_batch_code: r.smelting_batch_code.to_string(),
            vendor: defaults.vendor.clone(),
            makeup: defaults.makeup.clone(),
            label: String::new(),
            stage: defaults.stage.clone(),
            location: r.location.clone(),
            customer_code: config
                .customer_code_en
                .get(&r.customer)
                .cloned()
                .unwrap_or_default(),
        })
        .collect()
}

pub fn write_customer_details_csv(details: &[CustomerShipmentDetail], path: &Path) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for detail in details {
        writer.serialize(detail)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = details.len(), "客户发货明细已导出");
    Ok(())
}

// ==========================================
// 报告文件夹发货数汇总
// ==========================================

/// 报告文件名按空白拆分的段数
const REPORT_NAME_SEGMENTS: usize = 7;

/// 统计文件夹 (不递归) 中带项目标记的报告文件, 按型号汇总发货数
///
/// 文件名: {客户}{项目} {型号} {客户料号} {发货数} ({地区}) {炉号} {挤压批号}.xlsx
pub fn audit_batch_quantities(folder: &Path, project_tag: &str) -> ReportResult<BTreeMap<String, u64>> {
    let entries = fs::read_dir(folder).map_err(|_| ReportError::PathUnavailable(folder.to_path_buf()))?;

    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for entry in entries.filter_map(|e| e.ok()) {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.contains(project_tag) {
            continue;
        }

        let parts: Vec<&str> = name.split_whitespace().collect();
        let quantity = match parts.as_slice() {
            [_, _, _, quantity, ..] if parts.len() == REPORT_NAME_SEGMENTS => quantity.parse::<u64>().ok(),
            _ => None,
        };

        match quantity {
            Some(q) => *totals.entry(parts[1].to_string()).or_insert(0) += q,
            None => warn!(file = %name, "报告文件名格式不符, 跳过"),
        }
    }

    Ok(totals)
}
