// ==========================================
// 铝型材出货质量报告系统 - 引擎层
// ==========================================
// 职责: 关键字归一化 / 参考表关联 / 合格性检查 / 性能网格 / 报告写入
// 红线: 配置以不可变引用显式传入, 无全局状态
// ==========================================

pub mod conformance;
pub mod enrichment;
pub mod error;
pub mod functional_grid;
pub mod joiner;
pub mod key_normalizer;
pub mod orchestrator;
pub mod report_writer;

// 重导出核心引擎
pub use conformance::{evaluate_composition, evaluate_functional, CheckOutcome, ConformanceEvaluator};
pub use enrichment::{fill_from_ageing_qr, fill_from_process_card_qr};
pub use error::{ReportError, ReportResult};
pub use functional_grid::{condense_row, FunctionalGridAssembler, Grid, GridCell};
pub use joiner::{resolve_cpk_file, CpkFileMatch};
pub use orchestrator::{BatchReport, ReportGenerator, ReportInputs, ReportOutcome};
pub use report_writer::{format_shipment_date, sample_size, ReportGridWriter};
