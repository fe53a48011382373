// ==========================================
// 铝型材出货质量报告系统 - 报告配置
// ==========================================
// 职责: 型号布局 / 关键字映射 / 留样编号 / 路径等只读配置
// 加载: 启动时加载一次, 以不可变对象显式传入各引擎
// 查找顺序: 显式路径 → EXTRUSION_QA_CONFIG → 用户配置目录 → 内置默认
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// 配置文件路径环境变量
pub const CONFIG_ENV_VAR: &str = "EXTRUSION_QA_CONFIG";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件格式错误 ({path}): {message}")]
    FormatError { path: String, message: String },

    #[error("配置校验失败 (型号 {model_code}): {message}")]
    InvalidLayout { model_code: String, message: String },

    #[error("配置校验失败: {0}")]
    Invalid(String),
}

// ==========================================
// 基础配置结构
// ==========================================

/// 报告模板中的单元格坐标 (1 起始)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellAnchor {
    pub row: u32,
    pub column: u32,
}

impl CellAnchor {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// 关键字 → 编码 (客户/地区归一化)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMapping {
    pub pattern: String,
    pub code: String,
}

impl KeyMapping {
    fn new(pattern: &str, code: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            code: code.to_string(),
        }
    }
}

/// 点位替代规则: (检测项目, 点位) → 替代点位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPoint {
    pub test_group: String,
    pub point: String,
    pub fallback: String,
}

impl FallbackPoint {
    fn new(test_group: &str, point: &str, fallback: &str) -> Self {
        Self {
            test_group: test_group.to_string(),
            point: point.to_string(),
            fallback: fallback.to_string(),
        }
    }
}

// ==========================================
// 型号布局 (Model Code Layout)
// ==========================================

/// CPK 数据表来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpkSource {
    /// CPK 数据表目录
    pub path: PathBuf,
    /// 从 CPK 数据表复制的行数
    pub num_rows: usize,
    /// 报告中 CPK 区域起始单元格
    #[serde(default = "default_cpk_anchor")]
    pub anchor: CellAnchor,
}

fn default_cpk_anchor() -> CellAnchor {
    CellAnchor::new(12, 9)
}

/// 随机重量配置 (单位 0.1g)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightLayout {
    pub lower_limit: u32,
    pub upper_limit: u32,
    pub anchor: CellAnchor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCodeLayout {
    /// 图号
    pub schema_code: String,
    /// 客户料号
    pub customer_part_code: String,
    /// 品名
    pub part_name: String,
    /// 性能要求表所属零件族
    pub requirement_family: String,
    pub cpk: CpkSource,
    /// 性能区域起始单元格
    pub functional_anchor: CellAnchor,
    /// 成分区域起始单元格
    pub composition_anchor: CellAnchor,
    pub weight: WeightLayout,
}

/// 报告表头单元格位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCells {
    pub model_code: CellAnchor,
    pub shipment_date: CellAnchor,
    pub schema_code: CellAnchor,
    pub furnace_code: CellAnchor,
    pub total_quantity: CellAnchor,
    pub customer_part_code: CellAnchor,
    pub part_name: CellAnchor,
    pub sample_size: CellAnchor,
}

impl Default for HeaderCells {
    fn default() -> Self {
        Self {
            model_code: CellAnchor::new(3, 14),
            shipment_date: CellAnchor::new(4, 3),
            schema_code: CellAnchor::new(4, 7),
            furnace_code: CellAnchor::new(4, 11),
            total_quantity: CellAnchor::new(4, 14),
            customer_part_code: CellAnchor::new(4, 19),
            part_name: CellAnchor::new(5, 3),
            sample_size: CellAnchor::new(8, 1),
        }
    }
}

/// 数据与输出路径
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPaths {
    /// 报告模板目录, 模板文件名为 {型号}.xlsx
    pub template_dir: PathBuf,
    /// 报告输出目录
    pub output_dir: PathBuf,
    /// 成分上下限表
    pub composition_limits: PathBuf,
    /// 零件族 → 性能要求与点位表
    pub requirement_tables: BTreeMap<String, PathBuf>,
}

/// 发货批次固定派生值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDefaults {
    pub project: String,
    pub alloy_code: String,
    pub recycle_ratio: String,
    /// 报告文件名中的项目标记, 也用于汇总发货数时识别报告文件
    pub report_project_tag: String,
}

/// 性能区域可见范围
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalMask {
    /// 每行保留的前几列
    pub visible_columns: usize,
    /// 力学/电性能区域倒数第几行整行保留
    pub mechanical_full_row_from_end: usize,
}

/// 客户明细表固定值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetailDefaults {
    pub vendor: String,
    pub makeup: String,
    pub stage: String,
}

// ==========================================
// ReportConfig - 顶层配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub models: BTreeMap<String, ModelCodeLayout>,
    /// 型号自定义排序
    pub model_code_order: Vec<String>,
    pub location_mappings: Vec<KeyMapping>,
    pub customer_mappings: Vec<KeyMapping>,
    /// 客户 → 英文代码
    pub customer_code_en: BTreeMap<String, String>,
    /// 成分样品类型
    pub composition_sample_types: Vec<String>,
    /// OQC 留样编号, 按组优先级排列
    pub retention_sample_codes: Vec<Vec<String>>,
    pub fallback_points: Vec<FallbackPoint>,
    #[serde(default)]
    pub header_cells: HeaderCells,
    pub paths: DataPaths,
    pub shipment_defaults: ShipmentDefaults,
    pub functional_mask: FunctionalMask,
    pub customer_details: CustomerDetailDefaults,
}

impl ReportConfig {
    /// 从 JSON 文件加载并校验
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: ReportConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::FormatError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        config.validate()?;
        info!(path = %path.display(), models = config.models.len(), "配置加载完成");
        Ok(config)
    }

    /// 按查找顺序解析配置
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Self::load(Path::new(trimmed));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let candidate = config_dir.join("extrusion-qa").join("config.json");
            if candidate.is_file() {
                return Self::load(&candidate);
            }
            debug!(path = %candidate.display(), "用户配置不存在, 使用内置默认配置");
        }

        Ok(Self::default())
    }

    pub fn layout(&self, model_code: &str) -> Option<&ModelCodeLayout> {
        self.models.get(model_code)
    }

    /// 型号排序位置; 未登记的型号排在最后
    pub fn model_rank(&self, model_code: &str) -> usize {
        self.model_code_order
            .iter()
            .position(|m| m == model_code)
            .unwrap_or(self.model_code_order.len())
    }

    /// 所有留样编号 (按组展开)
    pub fn all_sample_codes(&self) -> Vec<String> {
        self.retention_sample_codes.iter().flatten().cloned().collect()
    }

    pub fn fallback_point(&self, test_group: &str, point: &str) -> Option<&str> {
        self.fallback_points
            .iter()
            .find(|f| f.test_group == test_group && f.point == point)
            .map(|f| f.fallback.as_str())
    }

    pub fn template_path(&self, model_code: &str) -> PathBuf {
        self.paths.template_dir.join(format!("{}.xlsx", model_code))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (model_code, layout) in &self.models {
            let invalid = |message: &str| ConfigError::InvalidLayout {
                model_code: model_code.clone(),
                message: message.to_string(),
            };

            if layout.weight.lower_limit > layout.weight.upper_limit {
                return Err(invalid("重量下限大于上限"));
            }

            let anchors = [
                layout.cpk.anchor,
                layout.functional_anchor,
                layout.composition_anchor,
                layout.weight.anchor,
            ];
            if anchors.iter().any(|a| a.row == 0 || a.column == 0) {
                return Err(invalid("单元格坐标从 1 开始"));
            }

            if !self
                .paths
                .requirement_tables
                .contains_key(&layout.requirement_family)
            {
                return Err(invalid(&format!(
                    "未配置零件族 {} 的性能要求表",
                    layout.requirement_family
                )));
            }
        }

        if self.retention_sample_codes.iter().all(|g| g.is_empty()) {
            return Err(ConfigError::Invalid("留样编号为空".to_string()));
        }

        Ok(())
    }
}

// ==========================================
// 内置默认配置 (254 项目三个量产型号)
// ==========================================
impl Default for ReportConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();

        models.insert(
            "KAP-7457上U-A76-50".to_string(),
            ModelCodeLayout {
                schema_code: "806-55322-04".to_string(),
                customer_part_code: "18242741-00".to_string(),
                part_name: "铝挤板_81.6x17.2x10.7MM_7R03_C".to_string(),
                requirement_family: "u_part".to_string(),
                cpk: CpkSource {
                    path: PathBuf::from("./test_files/cpk_datasheets/7457"),
                    num_rows: 51,
                    anchor: default_cpk_anchor(),
                },
                functional_anchor: CellAnchor::new(65, 9),
                composition_anchor: CellAnchor::new(81, 9),
                weight: WeightLayout {
                    lower_limit: 291,
                    upper_limit: 299,
                    anchor: CellAnchor::new(108, 9),
                },
            },
        );

        models.insert(
            "KAP-7461中板-A76-50".to_string(),
            ModelCodeLayout {
                schema_code: "806-55327-09".to_string(),
                customer_part_code: "18242780-00".to_string(),
                part_name: "铝挤板_156.8x81.4x11.1MM_7R03_C".to_string(),
                requirement_family: "mid_plate".to_string(),
                cpk: CpkSource {
                    path: PathBuf::from("./test_files/cpk_datasheets/7461"),
                    num_rows: 56,
                    anchor: default_cpk_anchor(),
                },
                functional_anchor: CellAnchor::new(70, 9),
                composition_anchor: CellAnchor::new(96, 9),
                weight: WeightLayout {
                    lower_limit: 2572,
                    upper_limit: 2585,
                    anchor: CellAnchor::new(123, 9),
                },
            },
        );

        models.insert(
            "KAP-7487下U-A76-50".to_string(),
            ModelCodeLayout {
                schema_code: "806-55323-05".to_string(),
                customer_part_code: "18242767-00".to_string(),
                part_name: "铝挤板_81.6x17.8x9.7MM_7R03_C".to_string(),
                requirement_family: "u_part".to_string(),
                cpk: CpkSource {
                    path: PathBuf::from("./test_files/cpk_datasheets/7487"),
                    num_rows: 64,
                    anchor: default_cpk_anchor(),
                },
                functional_anchor: CellAnchor::new(78, 9),
                composition_anchor: CellAnchor::new(94, 9),
                weight: WeightLayout {
                    lower_limit: 221,
                    upper_limit: 229,
                    anchor: CellAnchor::new(121, 9),
                },
            },
        );

        let mut requirement_tables = BTreeMap::new();
        requirement_tables.insert(
            "mid_plate".to_string(),
            PathBuf::from("./data/点位/202507_中板.csv"),
        );
        requirement_tables.insert(
            "u_part".to_string(),
            PathBuf::from("./data/点位/202507_U件.csv"),
        );

        let mut customer_code_en = BTreeMap::new();
        customer_code_en.insert("无锡精密".to_string(), "EPZ".to_string());
        customer_code_en.insert("无锡比亚迪".to_string(), "BYD".to_string());

        let sample_codes = |codes: &[&str]| codes.iter().map(|c| c.to_string()).collect::<Vec<_>>();

        Self {
            models,
            model_code_order: [
                "KAP-7461中板-A76-50",
                "KAP-7461中板-A76-85",
                "KAP-7457上U-A76-50",
                "KAP-7457上U-A76-85",
                "KAP-7487下U-A76-50",
                "KAP-7487下U-A76-85",
            ]
            .iter()
            .map(|m| m.to_string())
            .collect(),
            location_mappings: vec![
                KeyMapping::new("华阳", "HY"),
                KeyMapping::new("郎克斯", "LKS"),
                KeyMapping::new("朗克斯", "LKS"),
                KeyMapping::new("LKS", "LKS"),
            ],
            customer_mappings: vec![
                KeyMapping::new("精密", "无锡精密"),
                KeyMapping::new("EPZ", "无锡精密"),
                KeyMapping::new("金属", "无锡比亚迪"),
            ],
            customer_code_en,
            composition_sample_types: vec![
                "08-型材成分检验(尾）".to_string(),
                "08-型材成分检验（尾）".to_string(),
            ],
            retention_sample_codes: vec![
                sample_codes(&["Hot 1#", "Cool 1#", "Hot 2#", "Cool 2#"]),
                sample_codes(&["First Tail-AVG", "Last Tail-AVG"]),
                sample_codes(&["First Tail", "Last Tail"]),
                sample_codes(&[
                    "Cavity 1 First Tail-AVG",
                    "Cavity 1 Last Tail-AVG",
                    "Cavity 1 First Head-AVG",
                    "Cavity 1 Last Head-AVG",
                ]),
                sample_codes(&[
                    "Cavity 1 First Tail",
                    "Cavity 1 Last Tail",
                    "Cavity 1 First Head",
                    "Cavity 1 Last Head",
                ]),
            ],
            fallback_points: vec![
                FallbackPoint::new("维氏硬度", "C2", "S1"),
                FallbackPoint::new("铝合金金相显微组织", "S7", "S10"),
                FallbackPoint::new("铝合金金相显微组织", "S8", "S13"),
                FallbackPoint::new("铝合金金相显微组织", "S9", "S16"),
            ],
            header_cells: HeaderCells::default(),
            paths: DataPaths {
                template_dir: PathBuf::from("./报告模板"),
                output_dir: PathBuf::from("./报告输出"),
                composition_limits: PathBuf::from("./data/成分_元素条件.csv"),
                requirement_tables,
            },
            shipment_defaults: ShipmentDefaults {
                project: "Manchester".to_string(),
                alloy_code: "7R03".to_string(),
                recycle_ratio: "50%".to_string(),
                report_project_tag: "MANCHESTER".to_string(),
            },
            functional_mask: FunctionalMask {
                visible_columns: 2,
                mechanical_full_row_from_end: 2,
            },
            customer_details: CustomerDetailDefaults {
                vendor: "KAP".to_string(),
                makeup: "50% prime + 50% IP".to_string(),
                stage: "MP".to_string(),
            },
        }
    }
}
