// ==========================================
// 租屋管理系统 - 租金缴费排程
// ==========================================
// 职责: 按缴费方式列出租约期间内的应缴月份
// 输入: 缴费方式 + 租约起止日期
// 输出: (年, 月) 列表，按时间先后
// ==========================================

use crate::domain::types::PaymentMethod;
use chrono::{Datelike, Months, NaiveDate};

/// 租金缴费排程生成器（无状态）
pub struct RentScheduleGenerator {}

impl RentScheduleGenerator {
    pub fn new() -> Self {
        Self {}
    }

    /// 生成应缴月份
    ///
    /// # 规则
    /// - 月缴: 起始日起每月一次，至结束日（含）
    /// - 半年缴: 每次前进 6 个月，只保留 1 月与 7 月
    /// - 年缴: 每次前进 12 个月，只保留 1 月
    /// - 起始日晚于结束日 → 空列表
    pub fn generate(
        &self,
        method: PaymentMethod,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<(i32, u32)> {
        let (step, due_months): (u32, &[u32]) = match method {
            PaymentMethod::Monthly => (1, &[]),
            PaymentMethod::SemiAnnual => (6, &[1, 7]),
            PaymentMethod::Annual => (12, &[1]),
        };

        let mut schedule = Vec::new();
        let mut current = start;
        while current <= end {
            if due_months.is_empty() || due_months.contains(&current.month()) {
                schedule.push((current.year(), current.month()));
            }
            // 月底日期由 chrono 自动截到当月最后一天
            match current.checked_add_months(Months::new(step)) {
                Some(next) => current = next,
                None => break,
            }
        }
        schedule
    }
}

impl Default for RentScheduleGenerator {
    fn default() -> Self {
        Self::new()
    }
}
