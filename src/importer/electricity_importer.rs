// ==========================================
// 租屋管理系统 - 电费表格导入
// ==========================================
// 职责: 抄表表 / 台电单据表 → 领域对象
// 栏位: 中英文表头均可（英文不分大小写）
// 红线: 只做格式转换，不做分摊校验（交给引擎）
// ==========================================

use crate::domain::electricity::{MasterBill, MeterReading};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use std::path::Path;
use tracing::info;

// ===== 栏位别名 =====
pub const ROOM_COLUMNS: &[&str] = &["room", "房號", "房号"];
pub const START_COLUMNS: &[&str] = &["start", "上期", "上期讀數", "上期读数"];
pub const END_COLUMNS: &[&str] = &["end", "本期", "本期讀數", "本期读数"];
pub const LABEL_COLUMNS: &[&str] = &["label", "樓層", "楼层"];
pub const COST_COLUMNS: &[&str] = &["cost", "金額", "金额"];
pub const KWH_COLUMNS: &[&str] = &["kwh", "度數", "度数"];

/// 电费表格导入器
pub struct ElectricityImporter {
    parser: UniversalFileParser,
}

impl ElectricityImporter {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
        }
    }

    /// 读取抄表文件
    pub fn import_meter_readings<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<MeterReading>> {
        let records = self.parser.parse(path.as_ref())?;
        let readings = self.map_meter_readings(&records)?;
        info!(path = %path.as_ref().display(), count = readings.len(), "抄表文件导入完成");
        Ok(readings)
    }

    /// 读取台电单据文件
    pub fn import_master_bills<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<MasterBill>> {
        let records = self.parser.parse(path.as_ref())?;
        let bills = self.map_master_bills(&records)?;
        info!(path = %path.as_ref().display(), count = bills.len(), "台电单据文件导入完成");
        Ok(bills)
    }

    /// 原始行 → 抄表
    ///
    /// # 规则
    /// - 房号必填
    /// - 读数空白视为 0（未抄表）
    pub fn map_meter_readings(&self, records: &[RawRecord]) -> ImportResult<Vec<MeterReading>> {
        if let Some(first) = records.first() {
            require_column(first, ROOM_COLUMNS)?;
        }

        records
            .iter()
            .map(|record| {
                let room = get_text(record, ROOM_COLUMNS).ok_or_else(|| {
                    ImportError::FieldMappingError {
                        row: record.row,
                        message: "房号为空".to_string(),
                    }
                })?;
                Ok(MeterReading::new(
                    room,
                    parse_number(record, START_COLUMNS)?,
                    parse_number(record, END_COLUMNS)?,
                ))
            })
            .collect()
    }

    /// 原始行 → 台电单据
    ///
    /// # 规则
    /// - 标签必填
    /// - 金额 / 度数空白视为 0（引擎会当作未填写而跳过）
    pub fn map_master_bills(&self, records: &[RawRecord]) -> ImportResult<Vec<MasterBill>> {
        if let Some(first) = records.first() {
            require_column(first, LABEL_COLUMNS)?;
        }

        records
            .iter()
            .map(|record| {
                let label = get_text(record, LABEL_COLUMNS).ok_or_else(|| {
                    ImportError::FieldMappingError {
                        row: record.row,
                        message: "单据标签为空".to_string(),
                    }
                })?;
                Ok(MasterBill::new(
                    label,
                    parse_number(record, COST_COLUMNS)?,
                    parse_number(record, KWH_COLUMNS)?,
                ))
            })
            .collect()
    }
}

impl Default for ElectricityImporter {
    fn default() -> Self {
        Self::new()
    }
}

/// 按别名找到实际表头
fn find_column<'a>(record: &'a RawRecord, aliases: &[&str]) -> Option<(&'a str, &'a str)> {
    record.fields.iter().find_map(|(header, value)| {
        aliases
            .iter()
            .any(|alias| header.eq_ignore_ascii_case(alias))
            .then(|| (header.as_str(), value.as_str()))
    })
}

fn require_column(record: &RawRecord, aliases: &[&str]) -> ImportResult<()> {
    if find_column(record, aliases).is_none() {
        return Err(ImportError::MissingColumn(aliases.join(" / ")));
    }
    Ok(())
}

fn get_text(record: &RawRecord, aliases: &[&str]) -> Option<String> {
    find_column(record, aliases)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// 解析数值（允许千分位逗号；空白为 0）
fn parse_number(record: &RawRecord, aliases: &[&str]) -> ImportResult<f64> {
    let Some((header, value)) = find_column(record, aliases) else {
        return Ok(0.0);
    };
    let cleaned = value.trim().replace(',', "");
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    match cleaned.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ImportError::TypeConversionError {
            row: record.row,
            field: header.to_string(),
            message: format!("无法解析为数值: {}", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(row: usize, pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord {
            row,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_map_readings_with_chinese_headers() {
        let importer = ElectricityImporter::new();
        let records = vec![
            record(2, &[("房號", "2A"), ("上期", "1,200.5"), ("本期", "1250")]),
            record(3, &[("房號", "2B"), ("上期", ""), ("本期", "")]),
        ];
        let readings = importer.map_meter_readings(&records).unwrap();

        assert_eq!(readings[0], MeterReading::new("2A", 1200.5, 1250.0));
        assert!(readings[1].is_placeholder());
    }

    #[test]
    fn test_map_readings_english_headers_ignore_case() {
        let importer = ElectricityImporter::new();
        let records = vec![record(2, &[("Room", "1A"), ("START", "0"), ("End", "80")])];
        let readings = importer.map_meter_readings(&records).unwrap();
        assert_eq!(readings[0].end_reading, 80.0);
    }

    #[test]
    fn test_bad_number_reports_row_and_field() {
        let importer = ElectricityImporter::new();
        let records = vec![
            record(2, &[("room", "1A"), ("start", "0"), ("end", "10")]),
            record(5, &[("room", "1B"), ("start", "abc"), ("end", "10")]),
        ];
        match importer.map_meter_readings(&records) {
            Err(ImportError::TypeConversionError { row, field, .. }) => {
                assert_eq!(row, 5);
                assert_eq!(field, "start");
            }
            other => panic!("期望 TypeConversionError, 实际 {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_number_rejected() {
        let importer = ElectricityImporter::new();
        let records = vec![record(2, &[("room", "1A"), ("start", "0"), ("end", "NaN")])];
        assert!(matches!(
            importer.map_meter_readings(&records),
            Err(ImportError::TypeConversionError { row: 2, .. })
        ));
    }

    #[test]
    fn test_missing_room_is_field_mapping_error() {
        let importer = ElectricityImporter::new();
        let records = vec![record(3, &[("room", " "), ("start", "0"), ("end", "10")])];
        assert!(matches!(
            importer.map_meter_readings(&records),
            Err(ImportError::FieldMappingError { row: 3, .. })
        ));
    }

    #[test]
    fn test_map_master_bills() {
        let importer = ElectricityImporter::new();
        let records = vec![
            record(2, &[("樓層", "2F"), ("金額", "3000"), ("度數", "600")]),
            record(3, &[("樓層", "3F"), ("金額", ""), ("度數", "")]),
        ];
        let bills = importer.map_master_bills(&records).unwrap();
        assert_eq!(bills[0], MasterBill::new("2F", 3000.0, 600.0));
        assert!(!bills[1].is_usable());
    }

    #[test]
    fn test_missing_label_column() {
        let importer = ElectricityImporter::new();
        let records = vec![record(2, &[("cost", "1"), ("kwh", "1")])];
        assert!(matches!(
            importer.map_master_bills(&records),
            Err(ImportError::MissingColumn(_))
        ));
    }
}
