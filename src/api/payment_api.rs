// ==========================================
// 租屋管理系统 - 电费缴费 API
// ==========================================
// 职责: 缴费记录查询、登记收款、期间收缴汇总
// 状态: UNPAID → PARTIAL → PAID，由已缴金额推导
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::api::electricity_api::sort_by_layout;
use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::payment::{ElectricityPayment, PaymentSummary};
use crate::domain::types::PaymentStatus;
use crate::repository::payment_repo::PaymentRepository;
use crate::repository::period_repo::ElectricityPeriodRepository;

/// 电费缴费API
pub struct PaymentApi {
    period_repo: Arc<ElectricityPeriodRepository>,
    payment_repo: Arc<PaymentRepository>,
    config_manager: Arc<ConfigManager>,
}

impl PaymentApi {
    /// 创建新的PaymentApi实例
    pub fn new(
        period_repo: Arc<ElectricityPeriodRepository>,
        payment_repo: Arc<PaymentRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            period_repo,
            payment_repo,
            config_manager,
        }
    }

    fn ensure_period(&self, period_id: i64) -> ApiResult<()> {
        if self.period_repo.find_by_id(period_id)?.is_none() {
            return Err(ApiError::NotFound(format!("计费期间(id={})不存在", period_id)));
        }
        Ok(())
    }

    /// 查询期间的缴费记录（按房间配置顺序）
    pub fn list_payments(&self, period_id: i64) -> ApiResult<Vec<ElectricityPayment>> {
        self.ensure_period(period_id)?;

        let layout = self
            .config_manager
            .get_room_layout()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let mut payments = self.payment_repo.find_by_period(period_id)?;
        sort_by_layout(&mut payments, &layout, |p| p.room.as_str());
        Ok(payments)
    }

    /// 登记收款
    ///
    /// # 参数
    /// - period_id: 期间ID
    /// - room: 房号
    /// - paid_amount: 累计已缴金额（覆写，不是增量）
    /// - payment_date: 缴费日期；为空且金额 > 0 时取今天
    /// - notes: 备注；为空时保留原备注
    ///
    /// # 返回
    /// - Ok(ElectricityPayment): 更新后的记录
    /// - Err(ApiError::InvalidInput): 金额为负
    /// - Err(ApiError::NotFound): 该期间该房间没有缴费记录
    pub fn record_payment(
        &self,
        period_id: i64,
        room: &str,
        paid_amount: i64,
        payment_date: Option<NaiveDate>,
        notes: Option<&str>,
    ) -> ApiResult<ElectricityPayment> {
        if paid_amount < 0 {
            return Err(ApiError::InvalidInput(format!(
                "已缴金额不能为负: {}",
                paid_amount
            )));
        }
        let room = room.trim();
        if room.is_empty() {
            return Err(ApiError::InvalidInput("房号不能为空".to_string()));
        }

        let mut payment = self.payment_repo.find(period_id, room)?.ok_or_else(|| {
            ApiError::NotFound(format!("缴费记录(期间={}, 房号={})不存在", period_id, room))
        })?;

        let now = Local::now().naive_local();
        payment.paid_amount = paid_amount;
        payment.status = PaymentStatus::derive(payment.calculated_fee, paid_amount);
        payment.payment_date = match payment_date {
            Some(date) => Some(date),
            None if paid_amount > 0 => Some(now.date()),
            None => None,
        };
        if let Some(n) = notes {
            payment.notes = Some(n.trim().to_string()).filter(|n| !n.is_empty());
        }
        payment.updated_at = now;

        self.payment_repo.update_payment(&payment)?;
        info!(
            period_id,
            room,
            paid_amount,
            status = %payment.status,
            "缴费已登记"
        );
        Ok(payment)
    }

    /// 期间收缴汇总
    pub fn get_payment_summary(&self, period_id: i64) -> ApiResult<PaymentSummary> {
        self.ensure_period(period_id)?;
        let payments = self.payment_repo.find_by_period(period_id)?;
        Ok(PaymentSummary::from_payments(period_id, &payments))
    }
}
