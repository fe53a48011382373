// ==========================================
// 命令行集成测试
// ==========================================
// 测试目标: details 子命令从文件到明细 CSV 的完整流程
// ==========================================


use extrusion_qa_report::config::CONFIG_ENV_VAR;
use std::fs;
use std::process::Command;
use tempfile::tempdir;
use test_helpers::*;

#[test]
fn test_details_command_fills_ageing_qr_columns() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_shipments(&root.join("shipments.csv")).unwrap();
    write_reference_tables(root).unwrap();
    let output = root.join("details.csv");

    // 隔离用户配置目录, 使用内置默认配置
    let status = Command::new(env!("CARGO_BIN_EXE_extrusion-qa"))
        .env_remove(CONFIG_ENV_VAR)
        .env("HOME", root)
        .env("XDG_CONFIG_HOME", root.join("config"))
        .arg("details")
        .arg("--shipments")
        .arg(root.join("shipments.csv"))
        .arg("--ageing-qr")
        .arg(root.join("ageing_qr.csv"))
        .arg("--year")
        .arg(REFERENCE_YEAR.to_string())
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let content = fs::read_to_string(&output).unwrap();
    let mut lines = content.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("挤压批（二维码）"));
    assert!(header.contains("熔铸批号"));

    let first = lines.next().unwrap();
    assert!(first.contains(EXTRUSION_CODES[0]));
    assert!(first.contains("QR-A+QR-B"));
    assert!(first.contains("250701"));
}
