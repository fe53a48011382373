// ==========================================
// 铝型材出货质量报告系统 - 报告生成编排器
// ==========================================
// 用途: 协调单个发货批次的报告生成步骤, 以及整批循环
// 步骤: 性能检查 → 已有报告检查 → CPK → 性能区域 → 成分 → 重量 → 写盘
// 失败: 只中止当前条目, 批次继续
// ==========================================

use crate::config::{ModelCodeLayout, ReportConfig};
use crate::domain::{
    total_batch_quantity, CompositionLimit, CompositionRow, FunctionalPropertyRow,
    FunctionalRequirement, ReferenceTable, ShipmentBatchRecord, TestCommissionRow,
};
use crate::engine::conformance::evaluate_functional;
use crate::engine::error::{ReportError, ReportResult};
use crate::engine::functional_grid::FunctionalGridAssembler;
use crate::engine::joiner::{
    find_composition, find_files_with_substrings, resolve_cpk_file, CpkFileMatch,
};
use crate::engine::report_writer::{generate_random_weights, report_filename, ReportGridWriter};
use crate::report::grid::ReportGrid;
use crate::report::workbook::{read_cpk_block, ReportTemplate};
use rand::Rng;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

// ==========================================
// ReportInputs - 报告生成所需的已加载数据
// ==========================================
// 未加载的表为 None, 用到时报 MissingUpstreamData
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'b> {
    pub shipments: &'b [ShipmentBatchRecord],
    pub compositions: Option<&'b ReferenceTable<CompositionRow>>,
    pub composition_limits: &'b [CompositionLimit],
    pub functional_properties: Option<&'b ReferenceTable<FunctionalPropertyRow>>,
    pub test_commissions: Option<&'b ReferenceTable<TestCommissionRow>>,
    /// 零件族 → 性能要求
    pub requirements: &'b BTreeMap<String, Vec<FunctionalRequirement>>,
}

/// 单个条目的生成结果
#[derive(Debug)]
pub enum ReportOutcome {
    Generated(PathBuf),
    Failed { reason: ReportError },
}

impl ReportOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, ReportOutcome::Generated(_))
    }
}

impl From<ReportResult<PathBuf>> for ReportOutcome {
    fn from(result: ReportResult<PathBuf>) -> Self {
        match result {
            Ok(path) => ReportOutcome::Generated(path),
            Err(reason) => ReportOutcome::Failed { reason },
        }
    }
}

/// 整批生成结果: 更新性能状态后的记录 + 每条目结果 (与记录一一对应)
#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<ShipmentBatchRecord>,
    pub outcomes: Vec<ReportOutcome>,
}

impl BatchReport {
    pub fn generated_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_generated()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.generated_count()
    }
}

// ==========================================
// ReportGenerator - 报告生成器
// ==========================================
pub struct ReportGenerator<'a> {
    config: &'a ReportConfig,
    assembler: FunctionalGridAssembler<'a>,
    writer: ReportGridWriter<'a>,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self {
            config,
            assembler: FunctionalGridAssembler::new(config),
            writer: ReportGridWriter::new(config),
        }
    }

    /// 生成单个条目的报告
    ///
    /// # 返回
    /// - 更新了性能状态的记录 (性能检查从不中止生成)
    /// - 报告路径或失败原因
    #[instrument(skip_all, fields(
        model_code = %record.model_code,
        furnace = %record.casting_furnace_code,
        extrusion = %record.extrusion_batch_code
    ))]
    pub fn generate<R: Rng + ?Sized>(
        &self,
        record: &ShipmentBatchRecord,
        inputs: &ReportInputs<'_>,
        rng: &mut R,
    ) -> (ShipmentBatchRecord, ReportResult<PathBuf>) {
        let mut checked = record.clone();
        if let Some(commissions) = inputs.test_commissions {
            checked.functional_status = evaluate_functional(&checked, commissions);
        }

        let result = self.build_report(&checked, inputs, rng);
        match &result {
            Ok(path) => info!(path = %path.display(), "报告已生成"),
            Err(e) => warn!(error = %e, "报告生成失败"),
        }
        (checked, result)
    }

    /// 整批生成, 每个条目独立
    pub fn generate_all<R: Rng + ?Sized>(&self, inputs: &ReportInputs<'_>, rng: &mut R) -> BatchReport {
        let mut records = Vec::with_capacity(inputs.shipments.len());
        let mut outcomes = Vec::with_capacity(inputs.shipments.len());

        for record in inputs.shipments {
            let (checked, result) = self.generate(record, inputs, rng);
            records.push(checked);
            outcomes.push(ReportOutcome::from(result));
        }

        let batch = BatchReport { records, outcomes };
        info!(
            total = batch.outcomes.len(),
            generated = batch.generated_count(),
            failed = batch.failed_count(),
            "批量报告生成完成"
        );
        batch
    }

    fn build_report<R: Rng + ?Sized>(
        &self,
        record: &ShipmentBatchRecord,
        inputs: &ReportInputs<'_>,
        rng: &mut R,
    ) -> ReportResult<PathBuf> {
        let output_dir = &self.config.paths.output_dir;
        self.ensure_not_generated(record, output_dir)?;

        let layout = self
            .config
            .layout(&record.model_code)
            .ok_or_else(|| ReportError::not_found("型号布局", record.model_code.clone()))?;

        let total_quantity = total_batch_quantity(inputs.shipments, record);
        let mut template = ReportTemplate::open(&self.config.template_path(&record.model_code))?;
        let mut grid = ReportGrid::default();
        self.writer.write_header(&mut grid, record, layout, total_quantity)?;

        self.fill_cpk(&mut grid, record, layout)?;
        self.fill_functional(&mut grid, record, layout, inputs)?;
        self.fill_composition(&mut grid, record, layout, inputs)?;

        let weights = generate_random_weights(rng, layout.weight.lower_limit, layout.weight.upper_limit);
        self.writer.write_weights(&mut grid, layout, &weights);

        template.fill(&grid)?;
        fs::create_dir_all(output_dir)?;
        let file_name = report_filename(
            record,
            total_quantity,
            &self.config.shipment_defaults.report_project_tag,
        );
        let path = output_dir.join(file_name);
        template.save(&path)?;
        Ok(path)
    }

    /// 同一 (型号, 炉号, 地区, 客户) 已有报告则中止; 输出目录不存在视为无报告
    fn ensure_not_generated(&self, record: &ShipmentBatchRecord, output_dir: &Path) -> ReportResult<()> {
        if !output_dir.is_dir() {
            return Ok(());
        }

        let existing = find_files_with_substrings(
            output_dir,
            &[
                record.model_code.as_str(),
                record.casting_furnace_code.as_str(),
                record.location.as_str(),
                record.customer.as_str(),
            ],
        )?;

        match existing.first() {
            Some(path) => Err(ReportError::AlreadyExists(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            )),
            None => Ok(()),
        }
    }

    fn fill_cpk(
        &self,
        grid: &mut ReportGrid,
        record: &ShipmentBatchRecord,
        layout: &ModelCodeLayout,
    ) -> ReportResult<()> {
        let path = match resolve_cpk_file(&layout.cpk.path, &record.extrusion_batch_code)? {
            CpkFileMatch::Unique(path) => path,
            CpkFileMatch::Absent => {
                return Err(ReportError::not_found(
                    "CPK 数据表",
                    record.extrusion_batch_code.clone(),
                ))
            }
            CpkFileMatch::Ambiguous(files) => {
                return Err(ReportError::Ambiguous {
                    what: "CPK 数据表".to_string(),
                    key: record.extrusion_batch_code.clone(),
                    count: files.len(),
                })
            }
        };

        let block = read_cpk_block(&path, layout.cpk.num_rows)?;
        self.writer.write_cpk(grid, layout, &block);
        Ok(())
    }

    fn fill_functional(
        &self,
        grid: &mut ReportGrid,
        record: &ShipmentBatchRecord,
        layout: &ModelCodeLayout,
        inputs: &ReportInputs<'_>,
    ) -> ReportResult<()> {
        let properties = inputs
            .functional_properties
            .ok_or_else(|| ReportError::MissingUpstreamData("性能数据".to_string()))?;

        let requirements = inputs
            .requirements
            .get(&layout.requirement_family)
            .ok_or_else(|| {
                ReportError::MissingUpstreamData(format!("性能要求表 ({})", layout.requirement_family))
            })?;

        let block = self.assembler.assemble(record, requirements, properties);
        self.writer.write_functional(grid, layout, &block);
        Ok(())
    }

    fn fill_composition(
        &self,
        grid: &mut ReportGrid,
        record: &ShipmentBatchRecord,
        layout: &ModelCodeLayout,
        inputs: &ReportInputs<'_>,
    ) -> ReportResult<()> {
        let compositions = inputs
            .compositions
            .ok_or_else(|| ReportError::MissingUpstreamData("化学成分".to_string()))?;

        let composition = find_composition(compositions, &record.casting_furnace_code).ok_or_else(|| {
            ReportError::not_found("炉号化学成分", record.casting_furnace_code.clone())
        })?;

        self.writer
            .write_composition(grid, layout, composition, inputs.composition_limits);
        Ok(())
    }
}
