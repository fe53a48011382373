// ==========================================
// 铝型材出货质量报告系统 - 核心库
// ==========================================
// 用途: 发货批次二维码回填 / 合格性检查 / 出货检验报告生成
// 输入: 发货批次表 + 质量参考表 (Excel / CSV / 接口 JSON)
// 输出: 按型号模板填写的 xlsx 报告, 检查后的表格导出
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 型号布局与映射
pub mod config;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 检查与报告规则
pub mod engine;

// 报告层 - 工作簿读写与导出
pub mod report;

// 应用层 - 会话状态
pub mod app;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ConformanceStatus, FunctionalVerdict, LookupField, ReferenceTable, ShipmentBatchRecord,
};

// 配置
pub use config::{ModelCodeLayout, ReportConfig};

// 引擎
pub use engine::{
    BatchReport, ConformanceEvaluator, ReportError, ReportGenerator, ReportInputs, ReportOutcome,
};

// 应用
pub use app::QaSession;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "铝型材出货质量报告系统";
