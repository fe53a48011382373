// ==========================================
// 铝型材出货质量报告系统 - 数据表加载
// ==========================================
// 流程: 解析文件 (CSV/Excel/接口 JSON) → 行映射 → 参考表
// ==========================================

use crate::config::ReportConfig;
use crate::domain::{
    AgeingQrRow, CompositionLimit, CompositionRow, FunctionalPropertyRow, FunctionalRequirement,
    ProcessCardQrRow, ReferenceTable, ShipmentBatchRecord, TestCommissionRow,
};
use crate::importer::derivation::derive_shipments;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{
    AgeingQrMapper, CompositionLimitMapper, CompositionMapper, FunctionalPropertyMapper,
    ProcessCardQrMapper, RequirementMapper, TestCommissionMapper,
};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::RowMapper;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

fn load_with<M: RowMapper>(path: &Path, mapper: &M, table: &str) -> ImportResult<Vec<M::Row>> {
    let raw_rows = UniversalFileParser.parse(path)?;
    debug!(table, path = %path.display(), raw_rows = raw_rows.len(), "文件解析完成");

    let rows = mapper.map_rows(&raw_rows)?;
    info!(table, total = raw_rows.len(), kept = rows.len(), "数据表加载完成");
    Ok(rows)
}

/// 发货批次表 (已派生并排序)
pub fn load_shipments(
    path: &Path,
    config: &ReportConfig,
    reference_year: i32,
) -> ImportResult<Vec<ShipmentBatchRecord>> {
    let raw_rows = UniversalFileParser.parse(path)?;
    let records = derive_shipments(&raw_rows, config, reference_year)?;
    info!(table = "发货批次", rows = records.len(), "数据表加载完成");
    Ok(records)
}

pub fn load_ageing_qr(path: &Path) -> ImportResult<ReferenceTable<AgeingQrRow>> {
    load_with(path, &AgeingQrMapper::default(), "型材时效二维码").map(ReferenceTable::new)
}

pub fn load_process_card_qr(path: &Path) -> ImportResult<ReferenceTable<ProcessCardQrRow>> {
    load_with(path, &ProcessCardQrMapper::default(), "流程卡二维码").map(ReferenceTable::new)
}

pub fn load_composition_limits(path: &Path) -> ImportResult<Vec<CompositionLimit>> {
    load_with(path, &CompositionLimitMapper::default(), "成分上下限")
}

/// 化学成分; 元素列取自上下限表
pub fn load_compositions(
    path: &Path,
    limits: &[CompositionLimit],
    config: &ReportConfig,
) -> ImportResult<ReferenceTable<CompositionRow>> {
    let elements: Vec<String> = limits.iter().map(|l| l.element.clone()).collect();
    let mapper = CompositionMapper::new(&elements, &config.composition_sample_types);
    load_with(path, &mapper, "化学成分").map(ReferenceTable::new)
}

/// 性能数据可分多个文件 (如力学与金相分开导出), 按给定顺序拼接
pub fn load_functional_properties<P: AsRef<Path>>(
    paths: &[P],
    config: &ReportConfig,
) -> ImportResult<ReferenceTable<FunctionalPropertyRow>> {
    let sample_codes = config.all_sample_codes();
    let mapper = FunctionalPropertyMapper::new(&sample_codes);

    let mut rows = Vec::new();
    for path in paths {
        rows.extend(load_with(path.as_ref(), &mapper, "性能数据")?);
    }
    info!(files = paths.len(), rows = rows.len(), "性能数据合并完成");
    Ok(ReferenceTable::new(rows))
}

pub fn load_test_commissions(path: &Path) -> ImportResult<ReferenceTable<TestCommissionRow>> {
    load_with(path, &TestCommissionMapper::default(), "检测委托单").map(ReferenceTable::new)
}

/// 性能要求表; 行键必须唯一
pub fn load_requirements(path: &Path) -> ImportResult<Vec<FunctionalRequirement>> {
    let rows = load_with(path, &RequirementMapper::default(), "性能要求")?;

    let mut seen = HashSet::new();
    for (idx, row) in rows.iter().enumerate() {
        let key = row.row_key();
        if !seen.insert(key.clone()) {
            return Err(ImportError::DuplicateRequirementKey { row: idx + 1, key });
        }
    }
    Ok(rows)
}

/// 按零件族加载全部性能要求表
pub fn load_requirement_tables(
    config: &ReportConfig,
) -> ImportResult<BTreeMap<String, Vec<FunctionalRequirement>>> {
    config
        .paths
        .requirement_tables
        .iter()
        .map(|(family, path)| Ok((family.clone(), load_requirements(path)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn csv(content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_requirements_reject_duplicate_row_key() {
        let file = csv("检测项目,项目详细,点位\n维氏硬度,硬度值,C2\n维氏硬度,硬度值,C2\n");
        assert!(matches!(
            load_requirements(file.path()),
            Err(ImportError::DuplicateRequirementKey { row: 2, .. })
        ));
    }

    #[test]
    fn test_requirements_blank_point_is_none() {
        let file = csv("检测项目,项目详细,点位\n室温拉伸,抗拉强度,\n维氏硬度,硬度值,C2\n");
        let rows = load_requirements(file.path()).unwrap();
        assert_eq!(rows[0].test_point, None);
        assert_eq!(rows[1].row_key(), "维氏硬度|硬度值|C2");
    }

    #[test]
    fn test_compositions_use_limit_elements() {
        let limits_file = csv("成分,下限,上限\nZn,5.0,6.0\nMn,0.0,0.05\nCr,0.0,0.05\n");
        let comp_file = csv(
            "炉号,类型,Zn,Mn,Cr,Cu\nF01,08-型材成分检验（尾）,5.5,0.01,0.02,-\nF02,08-型材成分检验（尾）,-,0.01,0.02,0.1\n",
        );
        let config = ReportConfig::default();

        let limits = load_composition_limits(limits_file.path()).unwrap();
        let table = load_compositions(comp_file.path(), &limits, &config).unwrap();

        // Cu 不在上下限表中, 其占位符不影响 F01
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].casting_furnace_code, "F01");
        assert_eq!(table.rows()[0].element("Mn+Cr"), Some(0.03));
    }

    #[test]
    fn test_functional_properties_concatenate_in_order() {
        let mechanical = csv(
            "检测项目,型号,铝棒炉号,时效炉号,oqc样号,点位,硬度值,电导率,平均截距\n\
             维氏硬度,M,F01,A2507081,Hot 1#,C2,150,-,-\n",
        );
        let metallographic = csv(
            "检测项目,型号,铝棒炉号,时效炉号,oqc样号,点位,硬度值,电导率,平均截距\n\
             铝合金金相显微组织,M,F01,-,First Tail,S10,-,-,12.3\n",
        );
        let config = ReportConfig::default();

        let table =
            load_functional_properties(&[mechanical.path(), metallographic.path()], &config).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].test_group, "维氏硬度");
        assert_eq!(table.rows()[1].test_group, "铝合金金相显微组织");
        assert_eq!(table.rows()[1].measurement("平均截距"), Some("12.3"));
    }
}
