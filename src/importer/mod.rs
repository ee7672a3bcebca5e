// ==========================================
// 租屋管理系统 - 导入层
// ==========================================
// 职责: 外部表格 → 领域对象
// 支持: Excel, CSV
// ==========================================

pub mod electricity_importer;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use electricity_importer::ElectricityImporter;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
