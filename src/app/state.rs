// ==========================================
// 铝型材出货质量报告系统 - 会话状态
// ==========================================
// 职责: 持有已加载的发货批次表与参考表, 按操作顺序驱动各引擎
// 并发: 单操作员, 通过 &mut self 串行化
// ==========================================

use crate::config::ReportConfig;
use crate::domain::{
    AgeingQrRow, CompositionLimit, CompositionRow, FunctionalPropertyRow, FunctionalRequirement,
    LookupField, ProcessCardQrRow, ReferenceTable, ShipmentBatchRecord, TestCommissionRow,
};
use crate::engine::enrichment::{fill_from_ageing_qr, fill_from_process_card_qr};
use crate::engine::{
    BatchReport, ConformanceEvaluator, ReportError, ReportGenerator, ReportInputs, ReportResult,
};
use crate::importer::{self, ImportResult};
use crate::report::export::{customer_shipment_details, CustomerShipmentDetail};
use rand::Rng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn missing(what: &str) -> ReportError {
    ReportError::MissingUpstreamData(what.to_string())
}

/// 质检会话
pub struct QaSession {
    config: ReportConfig,
    reference_year: i32,

    shipments: Option<Vec<ShipmentBatchRecord>>,
    ageing_qr: Option<ReferenceTable<AgeingQrRow>>,
    process_card_qr: Option<ReferenceTable<ProcessCardQrRow>>,
    composition_limits: Option<Vec<CompositionLimit>>,
    compositions: Option<ReferenceTable<CompositionRow>>,
    functional_properties: Option<ReferenceTable<FunctionalPropertyRow>>,
    test_commissions: Option<ReferenceTable<TestCommissionRow>>,
    requirements: BTreeMap<String, Vec<FunctionalRequirement>>,
}

impl QaSession {
    /// # 参数
    /// - config: 报告配置
    /// - reference_year: 挤压批号补全年份
    pub fn new(config: ReportConfig, reference_year: i32) -> Self {
        Self {
            config,
            reference_year,
            shipments: None,
            ageing_qr: None,
            process_card_qr: None,
            composition_limits: None,
            compositions: None,
            functional_properties: None,
            test_commissions: None,
            requirements: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn shipments(&self) -> &[ShipmentBatchRecord] {
        self.shipments.as_deref().unwrap_or_default()
    }

    // ==========================================
    // 数据加载
    // ==========================================

    pub fn load_shipments(&mut self, path: &Path) -> ImportResult<usize> {
        let records = importer::load_shipments(path, &self.config, self.reference_year)?;
        let count = records.len();
        self.shipments = Some(records);
        Ok(count)
    }

    pub fn set_shipments(&mut self, records: Vec<ShipmentBatchRecord>) {
        self.shipments = Some(records);
    }

    pub fn load_ageing_qr(&mut self, path: &Path) -> ImportResult<()> {
        self.ageing_qr = Some(importer::load_ageing_qr(path)?);
        Ok(())
    }

    pub fn load_process_card_qr(&mut self, path: &Path) -> ImportResult<()> {
        self.process_card_qr = Some(importer::load_process_card_qr(path)?);
        Ok(())
    }

    /// 化学成分依赖上下限表的元素列, 两者一起加载
    pub fn load_compositions(&mut self, composition_path: &Path, limits_path: &Path) -> ImportResult<()> {
        let limits = importer::load_composition_limits(limits_path)?;
        self.compositions = Some(importer::load_compositions(composition_path, &limits, &self.config)?);
        self.composition_limits = Some(limits);
        Ok(())
    }

    /// 多个性能数据文件按给定顺序合并为一张表
    pub fn load_functional_properties<P: AsRef<Path>>(&mut self, paths: &[P]) -> ImportResult<()> {
        self.functional_properties = Some(importer::load_functional_properties(paths, &self.config)?);
        Ok(())
    }

    pub fn load_test_commissions(&mut self, path: &Path) -> ImportResult<()> {
        self.test_commissions = Some(importer::load_test_commissions(path)?);
        Ok(())
    }

    pub fn load_requirements(&mut self) -> ImportResult<()> {
        self.requirements = importer::load_requirement_tables(&self.config)?;
        Ok(())
    }

    // ==========================================
    // 回填与检查 (每步返回新记录集合)
    // ==========================================

    fn take_shipments(&mut self) -> ReportResult<Vec<ShipmentBatchRecord>> {
        self.shipments.take().ok_or_else(|| missing("发货批次表"))
    }

    pub fn fill_ageing_qr(&mut self) -> ReportResult<()> {
        let table = self.ageing_qr.as_ref().ok_or_else(|| missing("型材时效二维码"))?;
        let records = self.shipments.take().ok_or_else(|| missing("发货批次表"))?;
        self.shipments = Some(fill_from_ageing_qr(records, table));
        Ok(())
    }

    pub fn fill_process_card_qr(&mut self) -> ReportResult<()> {
        let table = self
            .process_card_qr
            .as_ref()
            .ok_or_else(|| missing("流程卡二维码记录"))?;
        let records = self.shipments.take().ok_or_else(|| missing("发货批次表"))?;
        self.shipments = Some(fill_from_process_card_qr(records, table));
        Ok(())
    }

    pub fn check_composition(&mut self) -> ReportResult<()> {
        let (Some(compositions), Some(limits)) = (&self.compositions, &self.composition_limits) else {
            return Err(missing("化学成分"));
        };
        let records = self.shipments.take().ok_or_else(|| missing("发货批次表"))?;
        let evaluator = ConformanceEvaluator::new(&self.config);
        self.shipments = Some(evaluator.check_composition(records, compositions, limits));
        Ok(())
    }

    /// # 返回
    /// 需提示操作员的路径问题 (每个路径一条)
    pub fn check_cpk(&mut self) -> ReportResult<Vec<String>> {
        let records = self.take_shipments()?;
        let outcome = ConformanceEvaluator::new(&self.config).check_cpk(records);
        self.shipments = Some(outcome.records);
        Ok(outcome.notices)
    }

    pub fn check_functional(&mut self) -> ReportResult<()> {
        let commissions = self
            .test_commissions
            .as_ref()
            .ok_or_else(|| missing("检测委托单"))?;
        let records = self.shipments.take().ok_or_else(|| missing("发货批次表"))?;
        let evaluator = ConformanceEvaluator::new(&self.config);
        self.shipments = Some(evaluator.check_functional(records, commissions));
        Ok(())
    }

    // ==========================================
    // 报告生成
    // ==========================================

    fn inputs<'b>(&'b self, shipments: &'b [ShipmentBatchRecord]) -> ReportInputs<'b> {
        ReportInputs {
            shipments,
            compositions: self.compositions.as_ref(),
            composition_limits: self.composition_limits.as_deref().unwrap_or_default(),
            functional_properties: self.functional_properties.as_ref(),
            test_commissions: self.test_commissions.as_ref(),
            requirements: &self.requirements,
        }
    }

    /// 生成全部报告; 性能状态随生成更新
    pub fn generate_all<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ReportResult<BatchReport> {
        let shipments = self.take_shipments()?;
        let batch = {
            let inputs = self.inputs(&shipments);
            ReportGenerator::new(&self.config).generate_all(&inputs, rng)
        };
        self.shipments = Some(batch.records.clone());
        Ok(batch)
    }

    /// 生成单个条目的报告
    pub fn generate_one<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> ReportResult<PathBuf> {
        let mut shipments = self.take_shipments()?;
        let Some(record) = shipments.get(index).cloned() else {
            let count = shipments.len();
            self.shipments = Some(shipments);
            return Err(ReportError::not_found("发货批次条目", format!("{} (共 {} 条)", index, count)));
        };

        let (checked, result) = {
            let inputs = self.inputs(&shipments);
            ReportGenerator::new(&self.config).generate(&record, &inputs, rng)
        };
        shipments[index] = checked;
        self.shipments = Some(shipments);
        result
    }

    /// 客户发货明细; 挤压批二维码与熔铸批号需先回填时效二维码
    pub fn customer_details(&self) -> ReportResult<Vec<CustomerShipmentDetail>> {
        let shipments = self.shipments.as_deref().ok_or_else(|| missing("发货批次表"))?;
        let unfilled = shipments
            .iter()
            .filter(|r| r.extrusion_qr_full == LookupField::Unfilled)
            .count();
        if unfilled > 0 {
            warn!(unfilled, "时效二维码未回填, 明细中挤压批二维码与熔铸批号为空");
        }
        let details = customer_shipment_details(shipments, &self.config);
        info!(rows = details.len(), "客户发货明细生成完成");
        Ok(details)
    }
}
