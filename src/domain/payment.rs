// ==========================================
// 租屋管理系统 - 电费缴费领域模型
// ==========================================
// 每期每房一笔缴费记录，由分摊结果生成
// 红线: 不含数据访问逻辑
// ==========================================

use crate::domain::types::PaymentStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ElectricityPayment - 电费缴费记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityPayment {
    // ===== 主键 =====
    pub period_id: i64, // 计费期间ID
    pub room: String,   // 房号

    // ===== 金额 =====
    pub calculated_fee: i64, // 应缴（来自分摊结果）
    pub paid_amount: i64,    // 已缴

    // ===== 状态 =====
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl ElectricityPayment {
    /// 未缴余额（多缴时为 0）
    pub fn balance(&self) -> i64 {
        (self.calculated_fee - self.paid_amount).max(0)
    }
}

// ==========================================
// PaymentSummary - 期间缴费汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub period_id: i64,
    pub total_due: i64,       // 应收合计
    pub total_paid: i64,      // 实收合计
    pub total_balance: i64,   // 未收合计
    pub paid_rooms: usize,    // 已缴房间数
    pub unpaid_rooms: usize,  // 未缴房间数
    pub partial_rooms: usize, // 部分缴房间数
    pub collection_rate: f64, // 收缴率 (%)，应收为 0 时为 0
}

impl PaymentSummary {
    /// 由缴费记录汇总
    ///
    /// # 规则
    /// - total_balance = Σ 各房 balance()（单房溢缴记为 0，不抵扣其他房间欠款）
    /// - collection_rate = total_paid / total_due × 100（保留 1 位小数）
    pub fn from_payments(period_id: i64, payments: &[ElectricityPayment]) -> Self {
        let total_due: i64 = payments.iter().map(|p| p.calculated_fee).sum();
        let total_paid: i64 = payments.iter().map(|p| p.paid_amount).sum();
        let count = |status: PaymentStatus| payments.iter().filter(|p| p.status == status).count();

        let collection_rate = if total_due > 0 {
            (total_paid as f64 / total_due as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            period_id,
            total_due,
            total_paid,
            total_balance: payments.iter().map(ElectricityPayment::balance).sum(),
            paid_rooms: count(PaymentStatus::Paid),
            unpaid_rooms: count(PaymentStatus::Unpaid),
            partial_rooms: count(PaymentStatus::Partial),
            collection_rate,
        }
    }
}
