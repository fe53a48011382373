// ==========================================
// 铝型材出货质量报告系统 - 领域类型定义
// ==========================================
// 职责: 检查状态、检测项目、送样结果等封闭枚举
// 红线: 每个状态字段任一时刻只有一个值,由最近一次检查覆写
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 检查状态 (Conformance Status)
// ==========================================
// CPK / 成分 两个状态列共用; 性能列见 FunctionalVerdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConformanceStatus {
    #[default]
    NotChecked, // 未检查
    Ok,              // 合格
    Ng,              // 不合格
    NoData,          // 找不到数据
    MultipleMatches, // 多个文件匹配
    PathError,       // 路径错误
}

impl ConformanceStatus {
    /// 写入状态列的固定显示文本
    pub fn label(&self) -> &'static str {
        match self {
            ConformanceStatus::NotChecked => "⚪️ 未检查",
            ConformanceStatus::Ok => "🟢 OK",
            ConformanceStatus::Ng => "🔴 NG",
            ConformanceStatus::NoData => "🟠 找不到数据",
            ConformanceStatus::MultipleMatches => "🟠 多数匹配",
            ConformanceStatus::PathError => "🔴 路径错误",
        }
    }
}

impl fmt::Display for ConformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// 检测项目 (Test Group)
// ==========================================
// 顺序即性能检查的优先顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestGroup {
    VickersHardness,           // 维氏硬度
    Conductivity,              // 电导率
    RoomTemperatureTensile,    // 室温拉伸
    MetallographicStructure,   // 铝合金金相显微组织
}

impl TestGroup {
    /// 性能检查顺序
    pub const CHECK_ORDER: [TestGroup; 4] = [
        TestGroup::VickersHardness,
        TestGroup::Conductivity,
        TestGroup::RoomTemperatureTensile,
        TestGroup::MetallographicStructure,
    ];

    /// 源数据中的检测项目名称
    pub fn as_str(&self) -> &'static str {
        match self {
            TestGroup::VickersHardness => "维氏硬度",
            TestGroup::Conductivity => "电导率",
            TestGroup::RoomTemperatureTensile => "室温拉伸",
            TestGroup::MetallographicStructure => "铝合金金相显微组织",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::CHECK_ORDER
            .into_iter()
            .find(|group| group.as_str() == value.trim())
    }

    /// 金相按熔铸炉号过滤,其余按时效批号过滤
    pub fn keyed_by_casting_furnace(&self) -> bool {
        matches!(self, TestGroup::MetallographicStructure)
    }
}

impl fmt::Display for TestGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 送样检验结果 (Inspection Result)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionResult {
    Pass,          // Y-合格
    Fail,          // N-不合格
    Other(String), // 未出结果或其他标记
}

impl InspectionResult {
    pub const PASS_MARKER: &'static str = "Y-合格";
    pub const FAIL_MARKER: &'static str = "N-不合格";

    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(Self::PASS_MARKER) => InspectionResult::Pass,
            Some(Self::FAIL_MARKER) => InspectionResult::Fail,
            Some(other) => InspectionResult::Other(other.to_string()),
            None => InspectionResult::Other(String::new()),
        }
    }
}

// ==========================================
// 性能检查结论 (Functional Verdict)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FunctionalVerdict {
    #[default]
    NotChecked,
    Ok,
    NoSubmission(TestGroup),
    Pending(TestGroup),
    Failed {
        group: TestGroup,
        commission_form_no: String,
    },
}

impl FunctionalVerdict {
    /// 折算到封闭状态集
    pub fn status(&self) -> ConformanceStatus {
        match self {
            FunctionalVerdict::NotChecked => ConformanceStatus::NotChecked,
            FunctionalVerdict::Ok => ConformanceStatus::Ok,
            FunctionalVerdict::NoSubmission(_) | FunctionalVerdict::Pending(_) => {
                ConformanceStatus::NoData
            }
            FunctionalVerdict::Failed { .. } => ConformanceStatus::Ng,
        }
    }
}

impl fmt::Display for FunctionalVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionalVerdict::NotChecked => f.write_str(ConformanceStatus::NotChecked.label()),
            FunctionalVerdict::Ok => f.write_str("🟢 合格"),
            FunctionalVerdict::NoSubmission(group) => write!(f, "🟠 {} 无送样记录", group),
            FunctionalVerdict::Pending(group) => write!(f, "🟠 {} 送样结果未出", group),
            FunctionalVerdict::Failed {
                group,
                commission_form_no,
            } => write!(f, "🔴 {}NG {}", group, commission_form_no),
        }
    }
}
