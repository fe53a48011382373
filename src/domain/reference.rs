// ==========================================
// 铝型材出货质量报告系统 - 参考数据表
// ==========================================
// 职责: 外部参考表的强类型行定义 (解析边界构建,核心不按列名取值)
// 表: 时效二维码 / 流程卡二维码 / 化学成分 / 性能 / 检测委托单
// ==========================================

use crate::domain::types::{InspectionResult, TestGroup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ReferenceTable - 不可变参考表
// ==========================================
// 行顺序即来源顺序, 多行匹配时取首行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTable<R> {
    rows: Vec<R>,
}

impl<R> ReferenceTable<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按表顺序返回第一条满足条件的行
    pub fn first_where<F>(&self, predicate: F) -> Option<&R>
    where
        F: Fn(&R) -> bool,
    {
        self.rows.iter().find(|row| predicate(row))
    }

    /// 返回所有满足条件的行(保持表顺序)
    pub fn filter<'a, F>(&'a self, predicate: F) -> impl Iterator<Item = &'a R> + 'a
    where
        F: Fn(&R) -> bool + 'a,
    {
        self.rows.iter().filter(move |row| predicate(row))
    }
}

impl<R> Default for ReferenceTable<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> FromIterator<R> for ReferenceTable<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ==========================================
// 型材时效二维码
// ==========================================
// 键: 型号 + 生产挤压批 + 铝棒炉号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeingQrRow {
    pub model_code: String,
    pub extrusion_batch_code: String,
    pub casting_furnace_code: String,
    pub extrusion_qr_code: String,
    pub smelting_batch_code: String,
}

// ==========================================
// 流程卡二维码记录
// ==========================================
// 键: 型号 + 挤压批号 + 炉号 + 时效批
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCardQrRow {
    pub model_code: String,
    pub extrusion_batch_code: String,
    pub casting_furnace_code: String,
    pub ageing_batch_code: String,
    pub qr_code: String,
}

// ==========================================
// 化学成分
// ==========================================
// 键: 炉号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRow {
    pub casting_furnace_code: String,
    pub sample_type: String,
    /// 元素 → 含量
    pub elements: BTreeMap<String, f64>,
}

impl CompositionRow {
    pub fn element(&self, name: &str) -> Option<f64> {
        self.elements.get(name).copied()
    }
}

/// 成分上下限 (成分_元素条件)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionLimit {
    pub element: String,
    pub lower: f64,
    pub upper: f64,
}

impl CompositionLimit {
    /// 闭区间; NaN 视为超限
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

// ==========================================
// 性能数据 (力学/金相检测结果)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalPropertyRow {
    pub test_group: String,
    pub model_code: String,
    pub casting_furnace_code: String,
    pub ageing_furnace_code: String,
    pub sample_code: String,
    pub test_point: Option<String>,
    /// 项目详细 (硬度值/电导率/抗拉强度...) → 测量值
    pub measurements: BTreeMap<String, String>,
}

impl FunctionalPropertyRow {
    /// 取测量值, 空值视为缺失
    pub fn measurement(&self, detail: &str) -> Option<&str> {
        self.measurements
            .get(detail)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

// ==========================================
// 检测委托单 (wtd1)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCommissionRow {
    pub commission_form_no: String,
    pub test_group: String,
    pub result: InspectionResult,
    pub model_code: String,
    pub extrusion_batch_code: Option<String>,
    pub casting_furnace_code: Option<String>,
    pub ageing_furnace_code: Option<String>,
}

// ==========================================
// 性能要求与点位
// ==========================================
// 行键: 检测项目|项目详细[|点位], 同一零件族内唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionalRequirement {
    pub test_group: String,
    pub test_detail: String,
    pub test_point: Option<String>,
}

impl FunctionalRequirement {
    pub fn row_key(&self) -> String {
        match &self.test_point {
            Some(point) => format!("{}|{}|{}", self.test_group, self.test_detail, point),
            None => format!("{}|{}", self.test_group, self.test_detail),
        }
    }

    pub fn group(&self) -> Option<TestGroup> {
        TestGroup::parse(&self.test_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_where_preserves_source_order() {
        let table: ReferenceTable<(u32, &str)> =
            vec![(1, "a"), (2, "b"), (1, "c")].into_iter().collect();
        assert_eq!(table.first_where(|r| r.0 == 1), Some(&(1, "a")));
        assert_eq!(table.filter(|r| r.0 == 1).count(), 2);
        assert!(table.first_where(|r| r.0 == 9).is_none());
    }

    #[test]
    fn test_requirement_row_key() {
        let with_point = FunctionalRequirement {
            test_group: "维氏硬度".to_string(),
            test_detail: "硬度值".to_string(),
            test_point: Some("C2".to_string()),
        };
        let without_point = FunctionalRequirement {
            test_group: "室温拉伸".to_string(),
            test_detail: "抗拉强度".to_string(),
            test_point: None,
        };
        assert_eq!(with_point.row_key(), "维氏硬度|硬度值|C2");
        assert_eq!(without_point.row_key(), "室温拉伸|抗拉强度");
    }

    #[test]
    fn test_limit_rejects_nan() {
        let limit = CompositionLimit {
            element: "Zn".to_string(),
            lower: 5.0,
            upper: 6.0,
        };
        assert!(limit.contains(5.0));
        assert!(limit.contains(6.0));
        assert!(!limit.contains(f64::NAN));
        assert!(!limit.contains(6.01));
    }
}
