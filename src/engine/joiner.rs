// ==========================================
// 铝型材出货质量报告系统 - 参考表关联
// ==========================================
// 职责: 发货批次行 × 参考表 的多键精确匹配; CPK 数据表文件查找
// 规则: 所有键完全相等 (区分大小写), 多行命中取表中首行
// ==========================================

use crate::domain::{
    AgeingQrRow, CompositionRow, ProcessCardQrRow, ReferenceTable, ShipmentBatchRecord,
};
use crate::engine::error::{ReportError, ReportResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

// ==========================================
// 表关联
// ==========================================

/// 型材时效二维码: 型号 + 生产挤压批 + 铝棒炉号
pub fn find_ageing_qr<'a>(
    table: &'a ReferenceTable<AgeingQrRow>,
    record: &ShipmentBatchRecord,
) -> Option<&'a AgeingQrRow> {
    table.first_where(|row| {
        row.model_code == record.model_code
            && row.extrusion_batch_code == record.extrusion_batch_code
            && row.casting_furnace_code == record.casting_furnace_code
    })
}

/// 流程卡二维码: 型号 + 挤压批号 + 炉号 + 时效批
pub fn find_process_card_qr<'a>(
    table: &'a ReferenceTable<ProcessCardQrRow>,
    record: &ShipmentBatchRecord,
) -> Option<&'a ProcessCardQrRow> {
    table.first_where(|row| {
        row.model_code == record.model_code
            && row.extrusion_batch_code == record.extrusion_batch_code
            && row.casting_furnace_code == record.casting_furnace_code
            && row.ageing_batch_code == record.ageing_batch_code
    })
}

/// 化学成分: 炉号
pub fn find_composition<'a>(
    table: &'a ReferenceTable<CompositionRow>,
    casting_furnace_code: &str,
) -> Option<&'a CompositionRow> {
    table.first_where(|row| row.casting_furnace_code == casting_furnace_code)
}

// ==========================================
// 文件查找
// ==========================================

/// 目录下文件名包含全部子串 (不区分大小写) 的文件, 按文件名排序
///
/// 目录不存在或不可读返回 PathUnavailable
pub fn find_files_with_substrings(directory: &Path, substrings: &[&str]) -> ReportResult<Vec<PathBuf>> {
    let entries =
        fs::read_dir(directory).map_err(|_| ReportError::PathUnavailable(directory.to_path_buf()))?;

    let needles: Vec<String> = substrings.iter().map(|s| s.to_lowercase()).collect();

    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            needles.iter().all(|needle| name.contains(needle.as_str()))
        })
        .map(|entry| entry.path())
        .collect();

    matches.sort();
    Ok(matches)
}

/// CPK 数据表查找结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpkFileMatch {
    Absent,
    Unique(PathBuf),
    Ambiguous(Vec<PathBuf>),
}

/// 在型号的 CPK 目录中查找文件名包含挤压批号的数据表
pub fn resolve_cpk_file(directory: &Path, extrusion_batch_code: &str) -> ReportResult<CpkFileMatch> {
    let code = extrusion_batch_code.trim();
    let mut files = find_files_with_substrings(directory, &[code])?;
    debug!(directory = %directory.display(), code, matches = files.len(), "CPK 数据表查找");

    Ok(match files.len() {
        0 => CpkFileMatch::Absent,
        1 => CpkFileMatch::Unique(files.remove(0)),
        _ => CpkFileMatch::Ambiguous(files),
    })
}
