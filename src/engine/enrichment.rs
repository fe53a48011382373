// ==========================================
// 铝型材出货质量报告系统 - 二维码回填
// ==========================================
// 职责: 按参考表回填挤压批二维码 / 熔铸批号 / 时效批次二维码
// 形式: 接收记录集合, 返回新的记录集合
// ==========================================

use crate::domain::{
    AgeingQrRow, LookupField, ProcessCardQrRow, ReferenceTable, ShipmentBatchRecord,
};
use crate::engine::joiner::{find_ageing_qr, find_process_card_qr};
use crate::importer::data_cleaner::DataCleaner;
use tracing::info;

/// 熔铸批号固定前缀长度
pub const SMELTING_PREFIX_LEN: usize = 2;
/// 时效批次二维码取末尾位数
pub const AGEING_QR_SUFFIX_LEN: usize = 4;
const QR_SEGMENT_SEPARATOR: char = '+';

/// 挤压批次二维码: 完整二维码最后一个 '+' 之后的部分
pub fn half_qr(full: &LookupField) -> LookupField {
    full.map_found(|qr| {
        qr.rsplit(QR_SEGMENT_SEPARATOR)
            .next()
            .unwrap_or_default()
            .to_string()
    })
}

/// 型材时效二维码回填
pub fn fill_from_ageing_qr(
    records: Vec<ShipmentBatchRecord>,
    table: &ReferenceTable<AgeingQrRow>,
) -> Vec<ShipmentBatchRecord> {
    let cleaner = DataCleaner;
    let mut missing = 0usize;

    let filled: Vec<ShipmentBatchRecord> = records
        .into_iter()
        .map(|mut record| {
            match find_ageing_qr(table, &record) {
                Some(row) => {
                    record.extrusion_qr_full = LookupField::Found(row.extrusion_qr_code.clone());
                    record.smelting_batch_code = LookupField::Found(
                        cleaner.skip_chars(&row.smelting_batch_code, SMELTING_PREFIX_LEN),
                    );
                }
                None => {
                    missing += 1;
                    record.extrusion_qr_full = LookupField::NotRecorded;
                    record.smelting_batch_code = LookupField::NotRecorded;
                }
            }
            record.extrusion_qr_half = half_qr(&record.extrusion_qr_full);
            record
        })
        .collect();

    info!(total = filled.len(), missing, "型材时效二维码回填完成");
    filled
}

/// 流程卡二维码回填
pub fn fill_from_process_card_qr(
    records: Vec<ShipmentBatchRecord>,
    table: &ReferenceTable<ProcessCardQrRow>,
) -> Vec<ShipmentBatchRecord> {
    let cleaner = DataCleaner;
    let mut missing = 0usize;

    let filled: Vec<ShipmentBatchRecord> = records
        .into_iter()
        .map(|mut record| {
            record.ageing_batch_qr = match find_process_card_qr(table, &record) {
                Some(row) => LookupField::Found(cleaner.last_chars(&row.qr_code, AGEING_QR_SUFFIX_LEN)),
                None => {
                    missing += 1;
                    LookupField::NotRecorded
                }
            };
            record
        })
        .collect();

    info!(total = filled.len(), missing, "流程卡二维码回填完成");
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ShipmentBatchRecord {
        ShipmentBatchRecord::new("HY", "无锡精密", "M", "F", "E", "A2507081")
    }

    #[test]
    fn test_ageing_fill_end_to_end() {
        let table: ReferenceTable<_> = vec![AgeingQrRow {
            model_code: "M".to_string(),
            extrusion_batch_code: "E".to_string(),
            casting_furnace_code: "F".to_string(),
            extrusion_qr_code: "X+Y".to_string(),
            smelting_batch_code: "ZZrest".to_string(),
        }]
        .into_iter()
        .collect();

        let filled = fill_from_ageing_qr(vec![record()], &table);
        assert_eq!(filled[0].extrusion_qr_full, LookupField::Found("X+Y".to_string()));
        assert_eq!(filled[0].smelting_batch_code, LookupField::Found("rest".to_string()));
        assert_eq!(filled[0].extrusion_qr_half, LookupField::Found("Y".to_string()));
    }

    #[test]
    fn test_ageing_fill_not_recorded() {
        let filled = fill_from_ageing_qr(vec![record()], &ReferenceTable::default());
        assert_eq!(filled[0].extrusion_qr_full, LookupField::NotRecorded);
        assert_eq!(filled[0].extrusion_qr_half, LookupField::NotRecorded);
        assert_eq!(filled[0].smelting_batch_code, LookupField::NotRecorded);
    }

    #[test]
    fn test_process_card_fill_takes_last_four() {
        let table: ReferenceTable<_> = vec![ProcessCardQrRow {
            model_code: "M".to_string(),
            extrusion_batch_code: "E".to_string(),
            casting_furnace_code: "F".to_string(),
            ageing_batch_code: "A2507081".to_string(),
            qr_code: "PC20250708AB12".to_string(),
        }]
        .into_iter()
        .collect();

        let mut other = record();
        other.ageing_batch_code = "A0000000".to_string();

        let filled = fill_from_process_card_qr(vec![record(), other], &table);
        assert_eq!(filled[0].ageing_batch_qr, LookupField::Found("AB12".to_string()));
        assert_eq!(filled[1].ageing_batch_qr, LookupField::NotRecorded);
    }

    #[test]
    fn test_half_qr_without_separator_is_whole() {
        assert_eq!(
            half_qr(&LookupField::Found("QR".to_string())),
            LookupField::Found("QR".to_string())
        );
    }
}
