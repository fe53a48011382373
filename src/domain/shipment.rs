// ==========================================
// 铝型材出货质量报告系统 - 发货批次实体
// ==========================================
// 职责: 发货批次表的一行 (地区/客户/型号/炉号/挤压批号/时效批号)
// 生命周期: 导入构建 → 各检查步骤返回新记录 → 报告生成只读
// ==========================================

use crate::domain::types::{ConformanceStatus, FunctionalVerdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 二维码回填未找到记录时写入的标记
pub const NOT_RECORDED: &str = "🟠 没记录";

// ==========================================
// 回填字段 (Lookup Field)
// ==========================================
// 区分: 尚未回填 / 找到 / 参考表无记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LookupField {
    #[default]
    Unfilled,
    Found(String),
    NotRecorded,
}

impl LookupField {
    /// 空字符串视为未回填
    pub fn from_source(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => LookupField::Found(v.trim().to_string()),
            _ => LookupField::Unfilled,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            LookupField::Found(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn map_found(&self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            LookupField::Found(v) => LookupField::Found(f(v)),
            other => other.clone(),
        }
    }
}

impl fmt::Display for LookupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupField::Unfilled => Ok(()),
            LookupField::Found(v) => f.write_str(v),
            LookupField::NotRecorded => f.write_str(NOT_RECORDED),
        }
    }
}

// ==========================================
// ShipmentBatchRecord - 发货批次记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentBatchRecord {
    // 汇总主键: (地区, 客户, 型号, 炉号)
    pub location: String,
    pub customer: String,
    pub model_code: String,
    pub casting_furnace_code: String,

    // 批次标识
    pub extrusion_batch_code: String,
    pub ageing_batch_code: String,

    // 发货信息
    pub shipment_date: String,
    pub batch_quantity: u64,

    // 派生信息
    pub project: String,
    pub schema_code: String,
    pub customer_part_code: String,
    pub alloy_code: String,
    pub recycle_ratio: String,
    pub die_code: String,
    pub ageing_furnace_code: String,
    pub customer_batch_code: String,

    // 二维码回填
    pub extrusion_qr_full: LookupField,
    pub extrusion_qr_half: LookupField,
    pub smelting_batch_code: LookupField,
    pub ageing_batch_qr: LookupField,

    // 检查状态
    pub cpk_status: ConformanceStatus,
    pub composition_status: ConformanceStatus,
    pub functional_status: FunctionalVerdict,
}

impl ShipmentBatchRecord {
    /// 最小字段构建, 其余字段取默认值
    pub fn new(
        location: impl Into<String>,
        customer: impl Into<String>,
        model_code: impl Into<String>,
        casting_furnace_code: impl Into<String>,
        extrusion_batch_code: impl Into<String>,
        ageing_batch_code: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            customer: customer.into(),
            model_code: model_code.into(),
            casting_furnace_code: casting_furnace_code.into(),
            extrusion_batch_code: extrusion_batch_code.into(),
            ageing_batch_code: ageing_batch_code.into(),
            shipment_date: String::new(),
            batch_quantity: 0,
            project: String::new(),
            schema_code: String::new(),
            customer_part_code: String::new(),
            alloy_code: String::new(),
            recycle_ratio: String::new(),
            die_code: String::new(),
            ageing_furnace_code: String::new(),
            customer_batch_code: String::new(),
            extrusion_qr_full: LookupField::Unfilled,
            extrusion_qr_half: LookupField::Unfilled,
            smelting_batch_code: LookupField::Unfilled,
            ageing_batch_qr: LookupField::Unfilled,
            cpk_status: ConformanceStatus::NotChecked,
            composition_status: ConformanceStatus::NotChecked,
            functional_status: FunctionalVerdict::NotChecked,
        }
    }

    /// 同一 (地区, 客户, 型号, 炉号) 视为同一汇总批
    pub fn same_aggregate(&self, other: &ShipmentBatchRecord) -> bool {
        self.location == other.location
            && self.customer == other.customer
            && self.model_code == other.model_code
            && self.casting_furnace_code == other.casting_furnace_code
    }
}

/// 同一汇总批的发货总数
pub fn total_batch_quantity(batch: &[ShipmentBatchRecord], entry: &ShipmentBatchRecord) -> u64 {
    batch
        .iter()
        .filter(|r| r.same_aggregate(entry))
        .map(|r| r.batch_quantity)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location: &str, furnace: &str, quantity: u64) -> ShipmentBatchRecord {
        let mut r = ShipmentBatchRecord::new(location, "无锡精密", "M", furnace, "E", "A");
        r.batch_quantity = quantity;
        r
    }

    #[test]
    fn test_total_batch_quantity_by_aggregate_key() {
        let batch = vec![
            record("HY", "F1", 100),
            record("HY", "F1", 250),
            record("HY", "F2", 40),
            record("LKS", "F1", 7),
        ];
        assert_eq!(total_batch_quantity(&batch, &batch[0]), 350);
        assert_eq!(total_batch_quantity(&batch, &batch[2]), 40);
        assert_eq!(total_batch_quantity(&batch, &batch[3]), 7);
    }

    #[test]
    fn test_lookup_field_display() {
        assert_eq!(LookupField::NotRecorded.to_string(), NOT_RECORDED);
        assert_eq!(LookupField::Unfilled.to_string(), "");
        assert_eq!(
            LookupField::from_source(Some(" QR1 ".to_string())),
            LookupField::Found("QR1".to_string())
        );
        assert_eq!(LookupField::from_source(Some("".to_string())), LookupField::Unfilled);
    }
}
