// ==========================================
// 铝型材出货质量报告系统 - 报告输出层
// ==========================================
// 职责: 报告工作表内存网格 / xlsx 读写 / CSV 导出
// ==========================================

pub mod export;
pub mod grid;
pub mod workbook;

pub use export::{
    audit_batch_quantities, customer_shipment_details, write_customer_details_csv,
    write_shipments_csv, CustomerShipmentDetail,
};
pub use grid::{CellValue, ReportGrid};
pub use workbook::{read_cpk_block, read_sheet, ReportTemplate};
