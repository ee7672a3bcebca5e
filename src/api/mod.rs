// ==========================================
// 租屋管理系统 - API 层
// ==========================================
// 职责: 业务接口, 组合引擎与仓储
// ==========================================

pub mod electricity_api;
pub mod error;
pub mod payment_api;

// 重导出
pub use electricity_api::{ElectricityApi, PeriodReport};
pub use error::{ApiError, ApiResult};
pub use payment_api::PaymentApi;
