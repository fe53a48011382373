// ==========================================
// 铝型材出货质量报告系统 - 导入层
// ==========================================
// 职责: 外部表格 → 强类型记录 / 参考表
// 支持: Excel, CSV, 接口 JSON
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod derivation;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod table_loader;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use derivation::{derive_shipments, sort_shipments, ShipmentRowMapper};
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, PayloadParser, UniversalFileParser};
pub use importer_trait::{FileParser, RawRow, RowMapper};
pub use table_loader::{
    load_ageing_qr, load_composition_limits, load_compositions, load_functional_properties,
    load_process_card_qr, load_requirement_tables, load_requirements, load_shipments,
    load_test_commissions,
};
