// ==========================================
// 铝型材出货质量报告系统 - 引擎错误类型
// ==========================================
// 职责: 报告生成各环节的可区分失败原因
// 策略: 单个条目失败只中止该条目, 批次继续
// ==========================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// 参考数据行或文件不存在
    #[error("找不到{what}: {key}")]
    NotFound { what: String, key: String },

    /// 同一键匹配到多个文件
    #[error("{what}存在多个匹配 ({key}): {count} 个")]
    Ambiguous {
        what: String,
        key: String,
        count: usize,
    },

    /// 配置的数据目录不存在或不可读
    #[error("路径不可用: {}", .0.display())]
    PathUnavailable(PathBuf),

    /// 该汇总批的报告已生成
    #[error("报告已存在: {0}")]
    AlreadyExists(String),

    /// 所需数据表尚未加载
    #[error("缺少上游数据: {0}")]
    MissingUpstreamData(String),

    /// 数值/日期字段格式错误
    #[error("字段 {field} 解析失败: {value}")]
    ParseFailure { field: String, value: String },

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("工作簿处理失败: {0}")]
    Workbook(String),
}

impl ReportError {
    pub fn not_found(what: &str, key: impl Into<String>) -> Self {
        ReportError::NotFound {
            what: what.to_string(),
            key: key.into(),
        }
    }
}

impl From<calamine::Error> for ReportError {
    fn from(err: calamine::Error) -> Self {
        ReportError::Workbook(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Io(std::io::Error::from(err))
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
