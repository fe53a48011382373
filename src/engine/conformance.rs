// ==========================================
// 铝型材出货质量报告系统 - 合格性检查
// ==========================================
// 职责: 成分范围检查 / CPK 数据表检查 / 性能送样检查
// 输出: 每次检查覆写对应状态列, 不抛错中断批次
// 红线: CPK 仅检查数据表存在且可打开, 不计算过程能力指数
// ==========================================

use crate::config::ReportConfig;
use crate::domain::{
    CompositionLimit, CompositionRow, ConformanceStatus, FunctionalVerdict, InspectionResult,
    ReferenceTable, ShipmentBatchRecord, TestCommissionRow, TestGroup,
};
use crate::engine::error::ReportError;
use crate::engine::joiner::{find_composition, resolve_cpk_file, CpkFileMatch};
use crate::report::workbook::open_check;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// 批量检查结果: 新记录集合 + 需提示操作员的消息 (每个路径一条)
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub records: Vec<ShipmentBatchRecord>,
    pub notices: Vec<String>,
}

// ==========================================
// 成分判定 (纯函数)
// ==========================================

/// 按上下限表顺序逐项检查, 首个超限元素即判 NG
///
/// - 无成分数据 → NoData
/// - 元素值缺失按超限处理
/// - 上下限表为空 → Ok
pub fn evaluate_composition(
    row: Option<&CompositionRow>,
    limits: &[CompositionLimit],
) -> ConformanceStatus {
    let Some(row) = row else {
        return ConformanceStatus::NoData;
    };

    for limit in limits {
        let value = row.element(&limit.element).unwrap_or(f64::NAN);
        if !limit.contains(value) {
            debug!(
                furnace = %row.casting_furnace_code,
                element = %limit.element,
                value,
                lower = limit.lower,
                upper = limit.upper,
                "成分超限"
            );
            return ConformanceStatus::Ng;
        }
    }

    ConformanceStatus::Ok
}

// ==========================================
// 性能判定 (纯函数)
// ==========================================

/// 按固定顺序检查各检测项目的送样记录, 遇到无记录/未出结果/不合格即停止
pub fn evaluate_functional(
    record: &ShipmentBatchRecord,
    commissions: &ReferenceTable<TestCommissionRow>,
) -> FunctionalVerdict {
    for group in TestGroup::CHECK_ORDER {
        let matched: Vec<&TestCommissionRow> = commissions
            .filter(|row| {
                row.model_code == record.model_code
                    && row.test_group == group.as_str()
                    && if group.keyed_by_casting_furnace() {
                        row.casting_furnace_code.as_deref() == Some(record.casting_furnace_code.as_str())
                    } else {
                        row.ageing_furnace_code.as_deref() == Some(record.ageing_batch_code.as_str())
                    }
            })
            .collect();

        if matched.is_empty() {
            return FunctionalVerdict::NoSubmission(group);
        }

        if matched.iter().any(|row| row.result == InspectionResult::Pass) {
            continue;
        }

        return match matched.iter().find(|row| row.result == InspectionResult::Fail) {
            Some(failed) => FunctionalVerdict::Failed {
                group,
                commission_form_no: failed.commission_form_no.clone(),
            },
            None => FunctionalVerdict::Pending(group),
        };
    }

    FunctionalVerdict::Ok
}

// ==========================================
// ConformanceEvaluator - 批量检查
// ==========================================
pub struct ConformanceEvaluator<'a> {
    config: &'a ReportConfig,
}

impl<'a> ConformanceEvaluator<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// 化学成分检查
    pub fn check_composition(
        &self,
        records: Vec<ShipmentBatchRecord>,
        compositions: &ReferenceTable<CompositionRow>,
        limits: &[CompositionLimit],
    ) -> Vec<ShipmentBatchRecord> {
        let checked: Vec<ShipmentBatchRecord> = records
            .into_iter()
            .map(|mut record| {
                let row = find_composition(compositions, &record.casting_furnace_code);
                record.composition_status = evaluate_composition(row, limits);
                record
            })
            .collect();

        log_summary("成分", checked.iter().map(|r| r.composition_status));
        checked
    }

    /// 单条 CPK 检查; Err 为需提示的路径问题
    fn cpk_status(&self, record: &ShipmentBatchRecord) -> Result<ConformanceStatus, ReportError> {
        let layout = self
            .config
            .layout(&record.model_code)
            .ok_or_else(|| ReportError::not_found("CPK 路径配置", record.model_code.clone()))?;

        let status = match resolve_cpk_file(&layout.cpk.path, &record.extrusion_batch_code)? {
            CpkFileMatch::Absent => ConformanceStatus::NoData,
            CpkFileMatch::Ambiguous(_) => ConformanceStatus::MultipleMatches,
            CpkFileMatch::Unique(path) => match open_check(&path) {
                Ok(()) => ConformanceStatus::Ok,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "CPK 数据表无法打开");
                    ConformanceStatus::PathError
                }
            },
        };
        Ok(status)
    }

    /// CPK 数据表检查; 同一缺失路径只提示一次, 批次继续
    pub fn check_cpk(&self, records: Vec<ShipmentBatchRecord>) -> CheckOutcome {
        let mut reported_paths: BTreeSet<PathBuf> = BTreeSet::new();
        let mut reported_models: BTreeSet<String> = BTreeSet::new();
        let mut notices = Vec::new();

        let checked: Vec<ShipmentBatchRecord> = records
            .into_iter()
            .map(|mut record| {
                record.cpk_status = match self.cpk_status(&record) {
                    Ok(status) => status,
                    Err(ReportError::PathUnavailable(path)) => {
                        if reported_paths.insert(path.clone()) {
                            warn!(model_code = %record.model_code, path = %path.display(), "CPK 路径不可用");
                            notices.push(format!(
                                "{} 型号的路径找不到：{}",
                                record.model_code,
                                path.display()
                            ));
                        }
                        ConformanceStatus::PathError
                    }
                    Err(e) => {
                        if reported_models.insert(record.model_code.clone()) {
                            warn!(model_code = %record.model_code, error = %e, "CPK 检查失败");
                            notices.push(e.to_string());
                        }
                        ConformanceStatus::PathError
                    }
                };
                record
            })
            .collect();

        log_summary("CPK", checked.iter().map(|r| r.cpk_status));
        CheckOutcome {
            records: checked,
            notices,
        }
    }

    /// 性能送样检查
    pub fn check_functional(
        &self,
        records: Vec<ShipmentBatchRecord>,
        commissions: &ReferenceTable<TestCommissionRow>,
    ) -> Vec<ShipmentBatchRecord> {
        let checked: Vec<ShipmentBatchRecord> = records
            .into_iter()
            .map(|mut record| {
                record.functional_status = evaluate_functional(&record, commissions);
                record
            })
            .collect();

        log_summary("性能", checked.iter().map(|r| r.functional_status.status()));
        checked
    }
}

fn log_summary(check: &str, statuses: impl Iterator<Item = ConformanceStatus>) {
    let (mut ok, mut ng, mut other) = (0usize, 0usize, 0usize);
    for status in statuses {
        match status {
            ConformanceStatus::Ok => ok += 1,
            ConformanceStatus::Ng => ng += 1,
            _ => other += 1,
        }
    }
    info!(check, ok, ng, other, "检查完成");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CpkSource;
    use std::collections::BTreeMap;
    use std::fs::File;
    use tempfile::tempdir;

    fn composition(values: &[(&str, f64)]) -> CompositionRow {
        CompositionRow {
            casting_furnace_code: "F".to_string(),
            sample_type: "08".to_string(),
            elements: values.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
        }
    }

    fn limit(element: &str, lower: f64, upper: f64) -> CompositionLimit {
        CompositionLimit {
            element: element.to_string(),
            lower,
            upper,
        }
    }

    #[test]
    fn test_composition_no_data() {
        assert_eq!(
            evaluate_composition(None, &[limit("Zn", 5.0, 6.0)]),
            ConformanceStatus::NoData
        );
    }

    #[test]
    fn test_composition_all_inside_is_ok() {
        let row = composition(&[("Zn", 5.5), ("Mg", 1.0)]);
        let limits = [limit("Zn", 5.0, 6.0), limit("Mg", 0.5, 1.5)];
        assert_eq!(evaluate_composition(Some(&row), &limits), ConformanceStatus::Ok);
    }

    #[test]
    fn test_composition_first_out_of_bound_short_circuits() {
        // 后续元素缺失也不影响结论
        let row = composition(&[("Zn", 9.9)]);
        let limits = [limit("Zn", 5.0, 6.0), limit("Mg", 0.5, 1.5)];
        assert_eq!(evaluate_composition(Some(&row), &limits), ConformanceStatus::Ng);
    }

    #[test]
    fn test_composition_missing_element_is_ng() {
        let row = composition(&[("Zn", 5.5)]);
        let limits = [limit("Zn", 5.0, 6.0), limit("Mg", 0.5, 1.5)];
        assert_eq!(evaluate_composition(Some(&row), &limits), ConformanceStatus::Ng);
    }

    #[test]
    fn test_composition_zero_limits_is_ok() {
        let row = composition(&[]);
        assert_eq!(evaluate_composition(Some(&row), &[]), ConformanceStatus::Ok);
    }

    fn commission(group: TestGroup, result: &str, form: &str) -> TestCommissionRow {
        TestCommissionRow {
            commission_form_no: form.to_string(),
            test_group: group.as_str().to_string(),
            result: InspectionResult::parse(Some(result)),
            model_code: "M".to_string(),
            extrusion_batch_code: None,
            casting_furnace_code: Some("F".to_string()),
            ageing_furnace_code: Some("A2507081".to_string()),
        }
    }

    fn record() -> ShipmentBatchRecord {
        ShipmentBatchRecord::new("HY", "无锡精密", "M", "F", "E", "A2507081")
    }

    fn all_pass() -> Vec<TestCommissionRow> {
        TestGroup::CHECK_ORDER
            .iter()
            .map(|g| commission(*g, "Y-合格", "WT-OK"))
            .collect()
    }

    #[test]
    fn test_functional_all_pass() {
        let table: ReferenceTable<_> = all_pass().into_iter().collect();
        assert_eq!(evaluate_functional(&record(), &table), FunctionalVerdict::Ok);
    }

    #[test]
    fn test_functional_stops_at_first_missing_group() {
        let rows: Vec<_> = all_pass()
            .into_iter()
            .filter(|r| r.test_group != TestGroup::Conductivity.as_str())
            .collect();
        let table: ReferenceTable<_> = rows.into_iter().collect();
        assert_eq!(
            evaluate_functional(&record(), &table),
            FunctionalVerdict::NoSubmission(TestGroup::Conductivity)
        );
    }

    #[test]
    fn test_functional_pending_and_failed() {
        let mut rows = all_pass();
        rows[2] = commission(TestGroup::RoomTemperatureTensile, "待检", "WT-3");
        let table: ReferenceTable<_> = rows.clone().into_iter().collect();
        assert_eq!(
            evaluate_functional(&record(), &table),
            FunctionalVerdict::Pending(TestGroup::RoomTemperatureTensile)
        );

        rows.push(commission(TestGroup::RoomTemperatureTensile, "N-不合格", "WT-9"));
        let table: ReferenceTable<_> = rows.into_iter().collect();
        assert_eq!(
            evaluate_functional(&record(), &table),
            FunctionalVerdict::Failed {
                group: TestGroup::RoomTemperatureTensile,
                commission_form_no: "WT-9".to_string(),
            }
        );
    }

    #[test]
    fn test_functional_metallographic_uses_casting_furnace() {
        let mut rows = all_pass();
        rows[3].casting_furnace_code = Some("OTHER".to_string());
        let table: ReferenceTable<_> = rows.into_iter().collect();
        assert_eq!(
            evaluate_functional(&record(), &table),
            FunctionalVerdict::NoSubmission(TestGroup::MetallographicStructure)
        );
    }

    fn config_with_cpk_dir(path: PathBuf) -> ReportConfig {
        let mut config = ReportConfig::default();
        for layout in config.models.values_mut() {
            layout.cpk = CpkSource {
                path: path.clone(),
                num_rows: 3,
                anchor: layout.cpk.anchor,
            };
        }
        config
    }

    fn shipment(extrusion: &str) -> ShipmentBatchRecord {
        ShipmentBatchRecord::new("HY", "无锡精密", "KAP-7457上U-A76-50", "F", extrusion, "A2507081")
    }

    #[test]
    fn test_cpk_missing_directory_reported_once() {
        let dir = tempdir().unwrap();
        let config = config_with_cpk_dir(dir.path().join("missing"));
        let evaluator = ConformanceEvaluator::new(&config);

        let outcome = evaluator.check_cpk(vec![shipment("E1"), shipment("E2"), shipment("E3")]);
        assert_eq!(outcome.notices.len(), 1);
        assert!(outcome
            .records
            .iter()
            .all(|r| r.cpk_status == ConformanceStatus::PathError));
    }

    #[test]
    fn test_cpk_absent_ambiguous_and_unreadable() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("E2 a.xlsx")).unwrap();
        File::create(dir.path().join("E2 b.xlsx")).unwrap();
        // 空文件无法作为工作簿打开
        File::create(dir.path().join("E3.xlsx")).unwrap();

        let config = config_with_cpk_dir(dir.path().to_path_buf());
        let evaluator = ConformanceEvaluator::new(&config);
        let outcome = evaluator.check_cpk(vec![shipment("E1"), shipment("E2"), shipment("E3")]);

        let statuses: Vec<_> = outcome.records.iter().map(|r| r.cpk_status).collect();
        assert_eq!(
            statuses,
            vec![
                ConformanceStatus::NoData,
                ConformanceStatus::MultipleMatches,
                ConformanceStatus::PathError,
            ]
        );
        assert!(outcome.notices.is_empty());
    }

    #[test]
    fn test_cpk_unknown_model_is_path_error() {
        let config = ReportConfig::default();
        let evaluator = ConformanceEvaluator::new(&config);
        let mut record = shipment("E1");
        record.model_code = "UNKNOWN".to_string();

        let outcome = evaluator.check_cpk(vec![record.clone(), record]);
        assert_eq!(outcome.records[0].cpk_status, ConformanceStatus::PathError);
        assert_eq!(outcome.notices.len(), 1);
    }
}
