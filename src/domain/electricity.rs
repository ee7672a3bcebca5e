// ==========================================
// 租屋管理系统 - 电费领域模型
// ==========================================
// 计费期间 / 台电单据 / 房间抄表 / 分摊结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

use crate::domain::types::RoomKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==========================================
// BillingPeriod - 计费期间
// ==========================================
/// 计费期间（同一年内的月份区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,        // 年份
    pub month_start: u32, // 开始月份 (1-12)
    pub month_end: u32,   // 结束月份 (1-12, ≥ month_start)
}

/// 计费期间校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("月份超出范围: {field}={value}（应为 1-12）")]
    MonthOutOfRange { field: &'static str, value: u32 },

    #[error("开始月份晚于结束月份: {start} > {end}")]
    StartAfterEnd { start: u32, end: u32 },
}

impl BillingPeriod {
    /// 创建计费期间
    ///
    /// # 错误
    /// - 月份不在 1-12
    /// - 开始月份 > 结束月份
    pub fn new(year: i32, month_start: u32, month_end: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month_start) {
            return Err(PeriodError::MonthOutOfRange {
                field: "month_start",
                value: month_start,
            });
        }
        if !(1..=12).contains(&month_end) {
            return Err(PeriodError::MonthOutOfRange {
                field: "month_end",
                value: month_end,
            });
        }
        if month_start > month_end {
            return Err(PeriodError::StartAfterEnd {
                start: month_start,
                end: month_end,
            });
        }
        Ok(Self {
            year,
            month_start,
            month_end,
        })
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}-{:02}", self.year, self.month_start, self.month_end)
    }
}

/// 已持久化的计费期间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityPeriod {
    pub id: i64,
    pub period: BillingPeriod,
    pub created_at: NaiveDateTime,
}

// ==========================================
// MasterBill - 台电单据
// ==========================================
/// 台电单据（可按楼层拆分多张，计算前加总）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterBill {
    pub label: String,   // 单据标签（例如 "2F"）
    pub total_cost: f64, // 金额
    pub total_kwh: f64,  // 度数
}

impl MasterBill {
    pub fn new(label: impl Into<String>, total_cost: f64, total_kwh: f64) -> Self {
        Self {
            label: label.into(),
            total_cost,
            total_kwh,
        }
    }

    /// 金额与度数都 > 0 才算有效（NaN 视为无效）
    pub fn is_usable(&self) -> bool {
        self.total_cost > 0.0 && self.total_kwh > 0.0
    }

    /// 同标签单据合并为一张（按首次出现的顺序）
    ///
    /// # 规则
    /// - 同标签的有效单据金额 / 度数相加
    /// - 无效单据不参与加总；某标签全部无效时保留第一张
    pub fn merge_by_label(bills: &[MasterBill]) -> Vec<MasterBill> {
        let mut merged: Vec<MasterBill> = Vec::with_capacity(bills.len());
        for bill in bills {
            let label = bill.label.trim();
            let Some(existing) = merged.iter_mut().find(|m| m.label == label) else {
                merged.push(MasterBill::new(label, bill.total_cost, bill.total_kwh));
                continue;
            };
            if !bill.is_usable() {
                continue;
            }
            if existing.is_usable() {
                existing.total_cost += bill.total_cost;
                existing.total_kwh += bill.total_kwh;
            } else {
                *existing = MasterBill::new(label, bill.total_cost, bill.total_kwh);
            }
        }
        merged
    }
}

// ==========================================
// MeterReading - 房间抄表
// ==========================================
/// 房间电表读数（上期 → 本期）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub room: String,       // 房号
    pub start_reading: f64, // 上期读数
    pub end_reading: f64,   // 本期读数
}

impl MeterReading {
    pub fn new(room: impl Into<String>, start_reading: f64, end_reading: f64) -> Self {
        Self {
            room: room.into(),
            start_reading,
            end_reading,
        }
    }

    /// 未抄表占位 (0, 0)
    pub fn placeholder(room: impl Into<String>) -> Self {
        Self::new(room, 0.0, 0.0)
    }

    pub fn is_placeholder(&self) -> bool {
        self.start_reading == 0.0 && self.end_reading == 0.0
    }
}

// ==========================================
// ReadingViolation - 抄表校验违规
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingViolationKind {
    EndBeforeStart, // 本期读数 < 上期读数
    Negative,       // 读数为负
    NonFinite,      // 读数非数值 (NaN / ∞)
}

impl fmt::Display for ReadingViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingViolationKind::EndBeforeStart => write!(f, "END_BEFORE_START"),
            ReadingViolationKind::Negative => write!(f, "NEGATIVE"),
            ReadingViolationKind::NonFinite => write!(f, "NON_FINITE"),
        }
    }
}

/// 单个房间的抄表问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingViolation {
    pub room: String,
    pub start_reading: f64,
    pub end_reading: f64,
    pub kind: ReadingViolationKind,
}

impl fmt::Display for ReadingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: 上期={} 本期={} ({})",
            self.room, self.start_reading, self.end_reading, self.kind
        )
    }
}

// ==========================================
// AllocationResult - 单房间分摊结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub room: String,     // 房号
    pub kind: RoomKind,   // 房间分类
    pub private_kwh: f64, // 房间度数（2 位小数）
    pub public_kwh: f64,  // 公用分摊（独立房间为 0）
    pub total_kwh: f64,   // 总度数
    pub unit_price: f64,  // 单价
    pub fee: i64,         // 应缴电费（整数元）
}

// ==========================================
// AllocationOutcome - 一次分摊计算的完整输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub unit_price: f64,           // 单价 = 总金额 / 总度数
    pub master_total_cost: f64,    // 有效台电单据金额合计
    pub master_total_kwh: f64,     // 有效台电单据度数合计
    pub shared_metered_kwh: f64,   // 分摊房间电表度数合计
    pub valid_shared_rooms: usize, // 有读数的分摊房间数
    pub public_kwh: f64,           // 公用电度数
    pub public_per_room: f64,      // 每间分摊房间的公用电（整数度）
    pub results: Vec<AllocationResult>,
}

impl AllocationOutcome {
    /// 应收电费合计
    pub fn total_fee(&self) -> i64 {
        self.results.iter().map(|r| r.fee).sum()
    }

    /// 按房号查询结果
    pub fn result_for(&self, room: &str) -> Option<&AllocationResult> {
        self.results.iter().find(|r| r.room == room)
    }
}

/// 已持久化的期间计算摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub period_id: i64,
    pub run_id: String, // 计算批次 ID (uuid)
    pub unit_price: f64,
    pub master_total_cost: f64,
    pub master_total_kwh: f64,
    pub shared_metered_kwh: f64,
    pub public_kwh: f64,
    pub public_per_room: f64,
    pub total_fee: i64,
    pub reason: String, // 计算说明 (JSON)
    pub notes: Option<String>,
    pub calculated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_period_validation() {
        assert!(BillingPeriod::new(2025, 1, 2).is_ok());
        assert!(BillingPeriod::new(2025, 5, 5).is_ok());
        assert_eq!(
            BillingPeriod::new(2025, 0, 2),
            Err(PeriodError::MonthOutOfRange {
                field: "month_start",
                value: 0
            })
        );
        assert_eq!(
            BillingPeriod::new(2025, 1, 13),
            Err(PeriodError::MonthOutOfRange {
                field: "month_end",
                value: 13
            })
        );
        assert_eq!(
            BillingPeriod::new(2025, 6, 3),
            Err(PeriodError::StartAfterEnd { start: 6, end: 3 })
        );
    }

    #[test]
    fn test_billing_period_display() {
        let period = BillingPeriod::new(2025, 3, 4).unwrap();
        assert_eq!(period.to_string(), "2025/03-04");
    }

    #[test]
    fn test_master_bill_usable() {
        assert!(MasterBill::new("2F", 100.0, 20.0).is_usable());
        assert!(!MasterBill::new("3F", 0.0, 20.0).is_usable());
        assert!(!MasterBill::new("4F", 100.0, 0.0).is_usable());
        assert!(!MasterBill::new("4F", -1.0, 20.0).is_usable());
        assert!(!MasterBill::new("4F", f64::NAN, 20.0).is_usable());
    }

    #[test]
    fn test_merge_by_label_sums_usable_bills() {
        let merged = MasterBill::merge_by_label(&[
            MasterBill::new("ALL", 6000.0, 1200.0),
            MasterBill::new("2F", 0.0, 0.0),
            MasterBill::new(" ALL ", 4000.0, 800.0),
            MasterBill::new("ALL", -100.0, 50.0),
            MasterBill::new("2F", 300.0, 60.0),
        ]);
        assert_eq!(
            merged,
            vec![
                MasterBill::new("ALL", 10000.0, 2000.0),
                MasterBill::new("2F", 300.0, 60.0),
            ]
        );
    }

    #[test]
    fn test_merge_by_label_keeps_unusable_placeholder() {
        let merged = MasterBill::merge_by_label(&[
            MasterBill::new("4F", 0.0, 0.0),
            MasterBill::new("4F", 10.0, 0.0),
        ]);
        assert_eq!(merged, vec![MasterBill::new("4F", 0.0, 0.0)]);
    }
}
