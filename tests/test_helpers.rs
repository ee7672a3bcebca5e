// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、测试环境、标准测试数据
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::path::PathBuf;

use rental_billing::app::AppState;
use rental_billing::db::{init_schema, open_sqlite_connection};
use rental_billing::{MasterBill, MeterReading};
use tempfile::{NamedTempFile, TempDir};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 测试环境（临时数据库 + AppState）
pub struct TestEnv {
    pub state: AppState,
    _temp_file: NamedTempFile,
}

impl TestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let (temp_file, db_path) = create_test_db()?;
        let state = AppState::new(db_path)?;
        Ok(Self {
            state,
            _temp_file: temp_file,
        })
    }
}

/// 写一个临时 CSV 文件
pub fn write_csv(content: &str) -> Result<(TempDir, PathBuf), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.csv");
    std::fs::write(&path, content)?;
    Ok((dir, path))
}

// ==========================================
// 标准测试数据
// ==========================================
// 台电合计 10000 元 / 2000 度 → 单价 5.0
// 分摊房间 9 间各用 50 度，4D 未抄表 → 公用 1550 度，每间 155 度
// 独立房间 1A 100 度、1B 80 度

/// 两张有效单据 + 一张未填写
pub fn standard_bills() -> Vec<MasterBill> {
    vec![
        MasterBill::new("2F", 6000.0, 1200.0),
        MasterBill::new("3F", 4000.0, 800.0),
        MasterBill::new("4F", 0.0, 0.0),
    ]
}

pub fn standard_readings() -> Vec<MeterReading> {
    let mut readings = vec![
        MeterReading::new("1A", 1000.0, 1100.0),
        MeterReading::new("1B", 500.0, 580.0),
    ];
    for room in ["2A", "2B", "3A", "3B", "3C", "3D", "4A", "4B", "4C"] {
        readings.push(MeterReading::new(room, 200.0, 250.0));
    }
    readings.push(MeterReading::placeholder("4D"));
    readings
}
