// ==========================================
// 租屋管理系统 - 引擎层
// ==========================================
// 职责: 实现计费规则,不拼 SQL
// 红线: Engine 不做 I/O, 计算结果必须可解释
// ==========================================

pub mod allocation;
pub mod rent_schedule;

// 重导出核心引擎
pub use allocation::{
    round0, round2, AllocationEngine, AllocationError, MasterTotals, MeterAggregate, MeteredRoom,
    PublicEnergy,
};
pub use rent_schedule::RentScheduleGenerator;
