// ==========================================
// 租屋管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod electricity;
pub mod payment;
pub mod room;
pub mod types;

// 重导出核心类型
pub use electricity::{
    AllocationOutcome, AllocationResult, BillingPeriod, CalculationSummary, ElectricityPeriod,
    MasterBill, MeterReading, PeriodError, ReadingViolation, ReadingViolationKind,
};
pub use payment::{ElectricityPayment, PaymentSummary};
pub use room::{RoomLayout, RoomLayoutError, RoomSpec};
pub use types::{PaymentMethod, PaymentStatus, RoomKind};
