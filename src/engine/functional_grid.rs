// ==========================================
// 铝型材出货质量报告系统 - 性能数据网格
// ==========================================
// 职责: (性能要求 × 留样编号) 矩阵 → 报告性能区域
// 流程: 分组填充(不覆盖) → 替代点位 → 左移压缩 → 截取 4 列 → 遮罩 → 拼接
// 分区: 力学/电性能 (按时效批号过滤) 在前, 金相 (按熔铸炉号过滤) 在后
// ==========================================

use crate::config::ReportConfig;
use crate::domain::{
    FunctionalPropertyRow, FunctionalRequirement, ReferenceTable, ShipmentBatchRecord,
};
use tracing::debug;

/// 报告中保留的样品列数
pub const REPORTED_SAMPLE_SLOTS: usize = 4;

pub type GridCell = Option<String>;
pub type Grid = Vec<Vec<GridCell>>;

// ==========================================
// 分区规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleSet {
    MechanicalElectrical,
    Metallographic,
}

impl RuleSet {
    const ORDER: [RuleSet; 2] = [RuleSet::MechanicalElectrical, RuleSet::Metallographic];

    fn includes(&self, requirement: &FunctionalRequirement) -> bool {
        match (self, requirement.group()) {
            (RuleSet::Metallographic, Some(group)) => group.keyed_by_casting_furnace(),
            (RuleSet::MechanicalElectrical, Some(group)) => !group.keyed_by_casting_furnace(),
            (_, None) => false,
        }
    }

    fn furnace_matches(&self, row: &FunctionalPropertyRow, record: &ShipmentBatchRecord) -> bool {
        match self {
            RuleSet::MechanicalElectrical => row.ageing_furnace_code == record.ageing_batch_code,
            RuleSet::Metallographic => row.casting_furnace_code == record.casting_furnace_code,
        }
    }
}

// ==========================================
// 行处理 (纯函数)
// ==========================================

/// 去掉空单元格并左移, 尾部补空, 行长不变
pub fn condense_row(row: &[GridCell]) -> Vec<GridCell> {
    let mut condensed: Vec<GridCell> = row.iter().filter(|c| c.is_some()).cloned().collect();
    condensed.resize(row.len(), None);
    condensed
}

fn truncate_columns(grid: &mut Grid, columns: usize) {
    for row in grid.iter_mut() {
        row.truncate(columns);
    }
}

/// 力学/电性能遮罩: 仅保留前几列, 以及倒数第 n 行整行
pub fn mask_mechanical(grid: &mut Grid, visible_columns: usize, full_row_from_end: usize) {
    let full_row = grid.len().checked_sub(full_row_from_end).filter(|_| full_row_from_end > 0);
    for (r, row) in grid.iter_mut().enumerate() {
        if Some(r) == full_row {
            continue;
        }
        row.iter_mut().skip(visible_columns).for_each(|cell| *cell = None);
    }
}

/// 金相遮罩: 仅保留前几列
pub fn mask_metallographic(grid: &mut Grid, visible_columns: usize) {
    for row in grid.iter_mut() {
        row.iter_mut().skip(visible_columns).for_each(|cell| *cell = None);
    }
}

// ==========================================
// FunctionalGridAssembler
// ==========================================
pub struct FunctionalGridAssembler<'a> {
    config: &'a ReportConfig,
}

impl<'a> FunctionalGridAssembler<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// 组装一个发货批次的性能区域
    pub fn assemble(
        &self,
        record: &ShipmentBatchRecord,
        requirements: &[FunctionalRequirement],
        properties: &ReferenceTable<FunctionalPropertyRow>,
    ) -> Grid {
        let mask = &self.config.functional_mask;
        let mut block = Grid::new();

        for rule_set in RuleSet::ORDER {
            let rows: Vec<&FunctionalRequirement> =
                requirements.iter().filter(|r| rule_set.includes(r)).collect();

            let filled = self.fill(record, &rows, rule_set, properties);
            let mut grid: Grid = filled.iter().map(|row| condense_row(row)).collect();
            truncate_columns(&mut grid, REPORTED_SAMPLE_SLOTS);

            match rule_set {
                RuleSet::MechanicalElectrical => mask_mechanical(
                    &mut grid,
                    mask.visible_columns,
                    mask.mechanical_full_row_from_end,
                ),
                RuleSet::Metallographic => mask_metallographic(&mut grid, mask.visible_columns),
            }

            block.extend(grid);
        }

        debug!(
            model_code = %record.model_code,
            furnace = %record.casting_furnace_code,
            rows = block.len(),
            "性能区域组装完成"
        );
        block
    }

    /// 按留样编号组的优先顺序填充, 已填单元格不覆盖
    fn fill(
        &self,
        record: &ShipmentBatchRecord,
        requirements: &[&FunctionalRequirement],
        rule_set: RuleSet,
        properties: &ReferenceTable<FunctionalPropertyRow>,
    ) -> Grid {
        let groups = &self.config.retention_sample_codes;
        let width: usize = groups.iter().map(Vec::len).sum();
        let mut grid: Grid = vec![vec![None; width]; requirements.len()];

        let mut offset = 0;
        for group in groups {
            for (r, requirement) in requirements.iter().enumerate() {
                for (i, sample_code) in group.iter().enumerate() {
                    let cell = &mut grid[r][offset + i];
                    if cell.is_some() {
                        continue;
                    }
                    *cell = self.lookup(record, requirement, sample_code, rule_set, properties);
                }
            }
            offset += group.len();
        }

        grid
    }

    /// 主匹配为空时才使用替代点位
    fn lookup(
        &self,
        record: &ShipmentBatchRecord,
        requirement: &FunctionalRequirement,
        sample_code: &str,
        rule_set: RuleSet,
        properties: &ReferenceTable<FunctionalPropertyRow>,
    ) -> GridCell {
        let base = |row: &FunctionalPropertyRow| {
            row.test_group == requirement.test_group
                && row.sample_code == sample_code
                && row.model_code == record.model_code
                && rule_set.furnace_matches(row, record)
        };

        let point = requirement.test_point.as_deref();
        let matched = properties
            .first_where(|row| base(row) && row.test_point.as_deref() == point)
            .or_else(|| {
                let fallback = point.and_then(|p| self.config.fallback_point(&requirement.test_group, p))?;
                debug!(
                    test_group = %requirement.test_group,
                    point = point.unwrap_or_default(),
                    fallback,
                    sample_code,
                    "使用替代点位"
                );
                properties.first_where(|row| base(row) && row.test_point.as_deref() == Some(fallback))
            })?;

        matched.measurement(&requirement.test_detail).map(str::to_string)
    }
}
