// ==========================================
// 铝型材出货质量报告系统 - 命令行入口
// ==========================================
// 子命令: check / generate / quantities / details
// 错误: 库内为强类型错误, 入口统一转 anyhow 输出
// ==========================================

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use extrusion_qa_report::report::{
    audit_batch_quantities, write_customer_details_csv, write_shipments_csv,
};
use extrusion_qa_report::{logging, QaSession, ReportConfig, ReportOutcome, APP_NAME, VERSION};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "extrusion-qa", version, about = "铝型材出货质量检查与报告生成")]
struct Cli {
    /// 配置文件 (缺省读取环境变量或内置默认)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 回填二维码并执行合格性检查, 导出带状态的发货批次表
    Check {
        #[command(flatten)]
        data: DataArgs,
        /// 导出路径 (CSV)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// 生成出货检验报告
    Generate {
        #[command(flatten)]
        data: DataArgs,
        /// 只生成指定条目 (从 0 开始)
        #[arg(long)]
        entry: Option<usize>,
    },
    /// 汇总报告文件夹内各型号发货数
    Quantities {
        folder: PathBuf,
        /// 项目标记 (缺省取配置)
        #[arg(long)]
        tag: Option<String>,
    },
    /// 导出客户发货明细 (挤压批二维码与熔铸批号取自时效二维码表)
    Details {
        #[arg(long)]
        shipments: PathBuf,
        /// 型材时效二维码表
        #[arg(long)]
        ageing_qr: PathBuf,
        /// 挤压批号补全年份 (缺省当前年份)
        #[arg(long)]
        year: Option<i32>,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    /// 发货批次表
    #[arg(long)]
    shipments: PathBuf,
    /// 型材时效二维码表
    #[arg(long)]
    ageing_qr: Option<PathBuf>,
    /// 流程卡二维码记录
    #[arg(long)]
    process_card_qr: Option<PathBuf>,
    /// 化学成分表 (上下限取配置路径)
    #[arg(long)]
    compositions: Option<PathBuf>,
    /// 性能数据表 (可多次指定, 按顺序合并)
    #[arg(long)]
    functional: Vec<PathBuf>,
    /// 检测委托单
    #[arg(long)]
    commissions: Option<PathBuf>,
    /// 挤压批号补全年份 (缺省当前年份)
    #[arg(long)]
    year: Option<i32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json_log);

    tracing::info!("{} v{}", APP_NAME, VERSION);

    let config = ReportConfig::resolve(cli.config.as_deref()).context("加载配置失败")?;
    config.validate().context("配置校验失败")?;

    match cli.command {
        Command::Check { data, output } => run_check(config, &data, &output),
        Command::Generate { data, entry } => run_generate(config, &data, entry),
        Command::Quantities { folder, tag } => {
            let tag = tag.unwrap_or_else(|| config.shipment_defaults.report_project_tag.clone());
            let totals = audit_batch_quantities(&folder, &tag)?;
            for (model_code, quantity) in &totals {
                println!("{}\t{}", model_code, quantity);
            }
            Ok(())
        }
        Command::Details {
            shipments,
            ageing_qr,
            year,
            output,
        } => {
            let year = year.unwrap_or_else(|| chrono::Local::now().year());
            let mut session = QaSession::new(config, year);
            session
                .load_shipments(&shipments)
                .with_context(|| format!("加载发货批次表失败: {}", shipments.display()))?;
            session.load_ageing_qr(&ageing_qr)?;
            session.fill_ageing_qr()?;
            write_customer_details_csv(&session.customer_details()?, &output)?;
            Ok(())
        }
    }
}

/// 按参数加载数据表; 未提供的表保持未加载
fn open_session(config: ReportConfig, data: &DataArgs) -> Result<QaSession> {
    let year = data.year.unwrap_or_else(|| chrono::Local::now().year());
    let mut session = QaSession::new(config, year);

    let count = session
        .load_shipments(&data.shipments)
        .with_context(|| format!("加载发货批次表失败: {}", data.shipments.display()))?;
    tracing::info!(rows = count, "发货批次表已加载");

    if let Some(path) = &data.ageing_qr {
        session.load_ageing_qr(path)?;
    }
    if let Some(path) = &data.process_card_qr {
        session.load_process_card_qr(path)?;
    }
    if let Some(path) = &data.compositions {
        let limits = session.config().paths.composition_limits.clone();
        session.load_compositions(path, &limits)?;
    }
    if !data.functional.is_empty() {
        session.load_functional_properties(data.functional.as_slice())?;
    }
    if let Some(path) = &data.commissions {
        session.load_test_commissions(path)?;
    }
    Ok(session)
}

fn run_check(config: ReportConfig, data: &DataArgs, output: &Path) -> Result<()> {
    let mut session = open_session(config, data)?;

    if data.ageing_qr.is_some() {
        session.fill_ageing_qr()?;
    }
    if data.process_card_qr.is_some() {
        session.fill_process_card_qr()?;
    }
    if data.compositions.is_some() {
        session.check_composition()?;
    }
    for notice in session.check_cpk()? {
        eprintln!("{}", notice);
    }
    if data.commissions.is_some() {
        session.check_functional()?;
    }

    write_shipments_csv(session.shipments(), output)?;
    Ok(())
}

fn run_generate(config: ReportConfig, data: &DataArgs, entry: Option<usize>) -> Result<()> {
    let mut session = open_session(config, data)?;
    session.load_requirements().context("加载性能要求表失败")?;
    if data.ageing_qr.is_some() {
        session.fill_ageing_qr()?;
    }

    let mut rng = rand::thread_rng();
    match entry {
        Some(index) => {
            let path = session.generate_one(index, &mut rng)?;
            println!("{}", path.display());
        }
        None => {
            let batch = session.generate_all(&mut rng)?;
            for (record, outcome) in batch.records.iter().zip(&batch.outcomes) {
                match outcome {
                    ReportOutcome::Generated(path) => println!("✅ {}", path.display()),
                    ReportOutcome::Failed { reason } => println!(
                        "❌ {} {} {}: {}",
                        record.model_code, record.casting_furnace_code, record.extrusion_batch_code, reason
                    ),
                }
            }
            println!("生成 {} 份, 失败 {} 份", batch.generated_count(), batch.failed_count());
        }
    }
    Ok(())
}
