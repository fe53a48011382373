// ==========================================
// 导入层集成测试
// ==========================================
// 测试目标: 接口 JSON / Excel / CSV 三种来源的发货批次表导入
// ==========================================


use extrusion_qa_report::importer::{self, ImportError};
use extrusion_qa_report::report::ReportGrid;
use extrusion_qa_report::ReportConfig;
use std::fs;
use tempfile::tempdir;
use test_helpers::*;

#[test]
fn test_shipments_from_api_payload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shipments.json");
    fs::write(
        &path,
        format!(
            r#"{{
                "data": {{
                    "titleList": [{{"zkhdq": "客户/地区"}}, {{"zbm": "型号"}}],
                    "list": [
                        {{"zkhdq": "郎克斯金属", "zbm": "{m}", "jy_no2": "K1-45-0708003",
                          "smelt_lot": "F02", "sx_no": "A2507092", "zfhs": 60, "zfhrq": "2025/07/09"}},
                        {{"zkhdq": null, "zbm": null, "jy_no2": null, "smelt_lot": null,
                          "sx_no": null, "zfhs": null, "zfhrq": null}}
                    ]
                }}
            }}"#,
            m = MODEL_CODE
        ),
    )
    .unwrap();

    let records = importer::load_shipments(&path, &ReportConfig::default(), REFERENCE_YEAR).unwrap();
    assert_eq!(records.len(), 1);

    let r = &records[0];
    assert_eq!(r.location, "LKS");
    assert_eq!(r.customer, "无锡比亚迪");
    assert_eq!(r.extrusion_batch_code, "K10045250708003");
    assert_eq!(r.batch_quantity, 60);
    assert_eq!(r.shipment_date, "2025/07/09");
}

#[test]
fn test_shipments_from_excel() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shipments.xlsx");

    let mut sheet = ReportGrid::new("发货");
    let headers = ["客户/地区", "型号", "挤压批号", "炉号", "时效批号", "发货数", "发货日期"];
    for (c, header) in headers.iter().enumerate() {
        sheet.set(1, c as u32 + 1, *header);
    }
    sheet.set(2, 1, "华阳精密");
    sheet.set(2, 2, MODEL_CODE);
    sheet.set(2, 3, "K10123250708011");
    sheet.set(2, 4, FURNACE);
    sheet.set(2, 5, AGEING_BATCH);
    sheet.set(2, 6, 120.0);
    sheet.set(2, 7, "2025-07-08");
    save_sheet(&sheet, &path).unwrap();

    let records = importer::load_shipments(&path, &ReportConfig::default(), REFERENCE_YEAR).unwrap();
    assert_eq!(records.len(), 1);
    // 已是标准格式的挤压批号保持不变
    assert_eq!(records[0].extrusion_batch_code, "K10123250708011");
    assert_eq!(records[0].batch_quantity, 120);
    assert_eq!(records[0].location, "HY");
}

#[test]
fn test_malformed_batch_code_rejects_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shipments.csv");
    write_csv(
        &path,
        &format!(
            "客户/地区,型号,挤压批号,炉号,时效批号,发货数,发货日期\n华阳精密,{},K1,{},{},10,2025-07-08\n",
            MODEL_CODE, FURNACE, AGEING_BATCH
        ),
    )
    .unwrap();

    let result = importer::load_shipments(&path, &ReportConfig::default(), REFERENCE_YEAR);
    assert!(matches!(result, Err(ImportError::BatchCodeFormatError(code)) if code == "K1"));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shipments.txt");
    fs::write(&path, "irrelevant").unwrap();

    let result = importer::load_shipments(&path, &ReportConfig::default(), REFERENCE_YEAR);
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
}

#[test]
fn test_requirement_tables_load_per_family() {
    let dir = tempdir().unwrap();
    write_reference_tables(dir.path()).unwrap();
    let config = test_config(dir.path());

    let tables = importer::load_requirement_tables(&config).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables["u_part"].len(), 3);
    assert_eq!(tables["u_part"][1].test_point, None);
}
