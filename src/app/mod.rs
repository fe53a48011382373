// ==========================================
// 铝型材出货质量报告系统 - 应用层
// ==========================================
// 职责: 持有会话状态, 连接命令行与引擎
// ==========================================

pub mod state;

// 重导出
pub use state::QaSession;
