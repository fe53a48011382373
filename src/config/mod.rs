// ==========================================
// 铝型材出货质量报告系统 - 配置层
// ==========================================
// 职责: 型号布局与映射表, 启动时加载一次
// 存储: JSON 文件 (缺省时使用内置默认)
// ==========================================

pub mod report_config;

// 重导出核心配置
pub use report_config::{
    CellAnchor, ConfigError, CpkSource, CustomerDetailDefaults, DataPaths, FallbackPoint,
    FunctionalMask, HeaderCells, KeyMapping, ModelCodeLayout, ReportConfig, ShipmentDefaults,
    WeightLayout, CONFIG_ENV_VAR,
};
