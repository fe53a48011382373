// ==========================================
// 铝型材出货质量报告系统 - 领域模型层
// ==========================================
// 职责: 定义实体、参考表行类型、状态枚举
// 红线: 不含文件读写,不含检查逻辑
// ==========================================

pub mod reference;
pub mod shipment;
pub mod types;

// 重导出核心类型
pub use reference::{
    AgeingQrRow, CompositionLimit, CompositionRow, FunctionalPropertyRow, FunctionalRequirement,
    ProcessCardQrRow, ReferenceTable, TestCommissionRow,
};
pub use shipment::{total_batch_quantity, LookupField, ShipmentBatchRecord, NOT_RECORDED};
pub use types::{ConformanceStatus, FunctionalVerdict, InspectionResult, TestGroup};
