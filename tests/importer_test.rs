// ==========================================
// 电费表格导入集成测试
// ==========================================
// 测试范围:
// 1. CSV 抄表 / 台电单据 → 领域对象
// 2. 导入 → 计算 → 保存 全流程
// 3. 错误行号
// ==========================================

mod test_helpers;

use rental_billing::importer::{ElectricityImporter, ImportError};
use rental_billing::MeterReading;
use test_helpers::{write_csv, TestEnv};

const BILLS_CSV: &str = "樓層,金額,度數\n2F,\"6,000\",1200\n3F,4000,800\n4F,,\n";

const READINGS_CSV: &str = "房號,上期,本期\n\
1A,1000,1100\n\
1B,500,580\n\
2A,200,250\n\
2B,200,250\n\
3A,200,250\n\
3B,200,250\n\
3C,200,250\n\
3D,200,250\n\
4A,200,250\n\
4B,200,250\n\
4C,200,250\n\
4D,,\n";

#[test]
fn test_导入台电单据() {
    let (_dir, path) = write_csv(BILLS_CSV).expect("写入失败");
    let bills = ElectricityImporter::new()
        .import_master_bills(&path)
        .expect("导入失败");

    assert_eq!(bills.len(), 3);
    assert_eq!(bills[0].label, "2F");
    assert_eq!(bills[0].total_cost, 6000.0);
    assert!(!bills[2].is_usable());
}

#[test]
fn test_导入抄表_英文表头() {
    let (_dir, path) =
        write_csv("Room,Start,End\n2A,10.5,20\n2B,0,0\n").expect("写入失败");
    let readings = ElectricityImporter::new()
        .import_meter_readings(&path)
        .expect("导入失败");

    assert_eq!(
        readings,
        vec![
            MeterReading::new("2A", 10.5, 20.0),
            MeterReading::placeholder("2B"),
        ]
    );
}

#[test]
fn test_导入后计算全流程() {
    let (_bills_dir, bills_path) = write_csv(BILLS_CSV).expect("写入失败");
    let (_readings_dir, readings_path) = write_csv(READINGS_CSV).expect("写入失败");

    let importer = ElectricityImporter::new();
    let bills = importer.import_master_bills(&bills_path).expect("导入失败");
    let readings = importer
        .import_meter_readings(&readings_path)
        .expect("导入失败");

    let env = TestEnv::new().expect("无法创建测试环境");
    let api = &env.state.electricity_api;
    let period_id = api.create_period(2025, 3, 4).expect("创建失败");
    let outcome = api
        .calculate_and_save(period_id, &bills, &readings, None)
        .expect("计算失败");

    assert_eq!(outcome.unit_price, 5.0);
    assert_eq!(outcome.public_per_room, 155.0);
    assert_eq!(outcome.results.len(), 11);
    assert_eq!(outcome.total_fee(), 10125);
}

#[test]
fn test_错误数值报告行号() {
    let (_dir, path) =
        write_csv("房號,上期,本期\n2A,0,10\n2B,abc,10\n").expect("写入失败");
    match ElectricityImporter::new().import_meter_readings(&path) {
        Err(ImportError::TypeConversionError { row, field, .. }) => {
            assert_eq!(row, 3);
            assert_eq!(field, "上期");
        }
        other => panic!("期望 TypeConversionError, 实际 {:?}", other),
    }
}

#[test]
fn test_文件不存在() {
    let result = ElectricityImporter::new().import_meter_readings("/nonexistent/readings.csv");
    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
}
