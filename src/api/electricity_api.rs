// ==========================================
// 租屋管理系统 - 电费分摊 API
// ==========================================
// 职责: 计费期间 → 单据 / 抄表 → 分摊计算 → 结果与缴费记录持久化
// 红线: 分摊失败时不写入任何结果
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::electricity::{
    AllocationOutcome, AllocationResult, BillingPeriod, CalculationSummary, ElectricityPeriod,
    MasterBill, MeterReading,
};
use crate::domain::payment::ElectricityPayment;
use crate::domain::room::RoomLayout;
use crate::engine::allocation::AllocationEngine;
use crate::repository::calculation_repo::CalculationRepository;
use crate::repository::payment_repo::PaymentRepository;
use crate::repository::period_repo::ElectricityPeriodRepository;
use crate::repository::reading_repo::ElectricityReadingRepository;

// ==========================================
// DTO
// ==========================================

/// 期间报表（单据、抄表、结果、缴费一次取回）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReport {
    pub period: ElectricityPeriod,
    pub master_bills: Vec<MasterBill>,
    pub meter_readings: Vec<MeterReading>,
    pub summary: Option<CalculationSummary>,
    pub results: Vec<AllocationResult>,
    pub payments: Vec<ElectricityPayment>,
}

// ==========================================
// ElectricityApi - 电费分摊 API
// ==========================================

/// 电费分摊API
///
/// 职责：
/// 1. 计费期间管理
/// 2. 台电单据 / 房间抄表录入
/// 3. 执行分摊并保存结果、摘要、缴费记录
/// 4. 报表查询
pub struct ElectricityApi {
    period_repo: Arc<ElectricityPeriodRepository>,
    reading_repo: Arc<ElectricityReadingRepository>,
    calculation_repo: Arc<CalculationRepository>,
    payment_repo: Arc<PaymentRepository>,
    config_manager: Arc<ConfigManager>,
}

impl ElectricityApi {
    /// 创建新的ElectricityApi实例
    pub fn new(
        period_repo: Arc<ElectricityPeriodRepository>,
        reading_repo: Arc<ElectricityReadingRepository>,
        calculation_repo: Arc<CalculationRepository>,
        payment_repo: Arc<PaymentRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            period_repo,
            reading_repo,
            calculation_repo,
            payment_repo,
            config_manager,
        }
    }

    // ==========================================
    // 计费期间
    // ==========================================

    /// 创建计费期间（已存在则返回原有ID）
    ///
    /// # 参数
    /// - year: 年份
    /// - month_start / month_end: 起止月份 (1-12)
    ///
    /// # 返回
    /// - Ok(i64): 期间ID
    /// - Err(ApiError::InvalidInput): 月份不合法
    pub fn create_period(&self, year: i32, month_start: u32, month_end: u32) -> ApiResult<i64> {
        let period = BillingPeriod::new(year, month_start, month_end)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

        let id = self.period_repo.find_or_create(&period)?;
        info!(period_id = id, period = %period, "计费期间就绪");
        Ok(id)
    }

    /// 列出全部计费期间（新的在前）
    pub fn list_periods(&self) -> ApiResult<Vec<ElectricityPeriod>> {
        Ok(self.period_repo.list_all()?)
    }

    /// 查询计费期间
    pub fn get_period(&self, period_id: i64) -> ApiResult<ElectricityPeriod> {
        self.period_repo
            .find_by_id(period_id)?
            .ok_or_else(|| ApiError::NotFound(format!("计费期间(id={})不存在", period_id)))
    }

    // ==========================================
    // 单据与抄表
    // ==========================================

    /// 保存台电单据（按标签覆写，同一批内同标签的有效单据相加）
    pub fn save_master_bills(&self, period_id: i64, bills: &[MasterBill]) -> ApiResult<usize> {
        self.get_period(period_id)?;

        for bill in bills {
            if bill.label.trim().is_empty() {
                return Err(ApiError::InvalidInput("台电单据标签不能为空".to_string()));
            }
            if !bill.total_cost.is_finite() || !bill.total_kwh.is_finite() {
                return Err(ApiError::InvalidInput(format!(
                    "台电单据 {} 的金额或度数不是有效数值",
                    bill.label
                )));
            }
        }

        // 同标签单据在库中只有一行，先合并再写入
        let merged = MasterBill::merge_by_label(bills);
        if merged.len() < bills.len() {
            warn!(
                period_id,
                input = bills.len(),
                merged = merged.len(),
                "台电单据标签重复，已按标签加总"
            );
        }

        let count = self.reading_repo.upsert_master_bills(period_id, &merged)?;
        info!(period_id, count, "台电单据已保存");
        Ok(count)
    }

    /// 保存房间抄表（按房号覆写）
    ///
    /// 读数是否合理由分摊时统一校验，这里只拦截无法存储的值
    pub fn save_meter_readings(&self, period_id: i64, readings: &[MeterReading]) -> ApiResult<usize> {
        self.get_period(period_id)?;

        for reading in readings {
            if reading.room.trim().is_empty() {
                return Err(ApiError::InvalidInput("房号不能为空".to_string()));
            }
            if !reading.start_reading.is_finite() || !reading.end_reading.is_finite() {
                return Err(ApiError::InvalidInput(format!(
                    "房间 {} 的读数不是有效数值",
                    reading.room
                )));
            }
        }

        let count = self.reading_repo.upsert_meter_readings(period_id, readings)?;
        info!(period_id, count, "房间抄表已保存");
        Ok(count)
    }

    // ==========================================
    // 分摊计算
    // ==========================================

    /// 试算（不写库）
    pub fn preview(&self, bills: &[MasterBill], readings: &[MeterReading]) -> ApiResult<AllocationOutcome> {
        let engine = self.build_engine()?;
        Ok(engine.allocate(bills, readings)?)
    }

    /// 按已保存的单据与抄表计算，并保存结果
    ///
    /// # 参数
    /// - period_id: 期间ID
    /// - notes: 本次计算备注
    ///
    /// # 返回
    /// - Ok(AllocationOutcome): 计算结果
    /// - Err(ApiError::Allocation): 输入数据问题（未写入任何数据）
    pub fn calculate_period(
        &self,
        period_id: i64,
        notes: Option<&str>,
    ) -> ApiResult<AllocationOutcome> {
        let period = self.get_period(period_id)?;
        let bills = self.reading_repo.find_master_bills(period_id)?;
        let readings = self.reading_repo.find_meter_readings(period_id)?;

        let engine = self.build_engine()?;
        let outcome = engine.allocate(&bills, &readings).map_err(|e| {
            warn!(period_id, code = e.code(), error = %e, "分摊计算失败");
            ApiError::from(e)
        })?;

        let now = Local::now().naive_local();
        let summary = CalculationSummary {
            period_id,
            run_id: Uuid::new_v4().to_string(),
            unit_price: outcome.unit_price,
            master_total_cost: outcome.master_total_cost,
            master_total_kwh: outcome.master_total_kwh,
            shared_metered_kwh: outcome.shared_metered_kwh,
            public_kwh: outcome.public_kwh,
            public_per_room: outcome.public_per_room,
            total_fee: outcome.total_fee(),
            reason: engine.generate_reason(&outcome),
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            calculated_at: now,
        };

        self.calculation_repo
            .save_calculation(period_id, &outcome.results, &summary)?;

        info!(
            period_id,
            period = %period.period,
            run_id = %summary.run_id,
            unit_price = outcome.unit_price,
            public_kwh = outcome.public_kwh,
            rooms = outcome.results.len(),
            total_fee = summary.total_fee,
            "电费分摊完成并已保存"
        );

        Ok(outcome)
    }

    /// 保存单据与抄表后立即计算
    pub fn calculate_and_save(
        &self,
        period_id: i64,
        bills: &[MasterBill],
        readings: &[MeterReading],
        notes: Option<&str>,
    ) -> ApiResult<AllocationOutcome> {
        self.save_master_bills(period_id, bills)?;
        self.save_meter_readings(period_id, readings)?;
        self.calculate_period(period_id, notes)
    }

    // ==========================================
    // 报表
    // ==========================================

    /// 查询期间报表（结果与缴费按房间配置顺序排列）
    pub fn get_period_report(&self, period_id: i64) -> ApiResult<PeriodReport> {
        let period = self.get_period(period_id)?;
        let layout = self.load_layout()?;

        let mut results = self.calculation_repo.find_results(period_id)?;
        sort_by_layout(&mut results, &layout, |r| r.room.as_str());

        let mut payments = self.payment_repo.find_by_period(period_id)?;
        sort_by_layout(&mut payments, &layout, |p| p.room.as_str());

        let mut meter_readings = self.reading_repo.find_meter_readings(period_id)?;
        sort_by_layout(&mut meter_readings, &layout, |r| r.room.as_str());

        Ok(PeriodReport {
            period,
            master_bills: self.reading_repo.find_master_bills(period_id)?,
            meter_readings,
            summary: self.calculation_repo.find_summary(period_id)?,
            results,
            payments,
        })
    }

    /// 查询期间最近一次计算摘要
    pub fn get_calculation_summary(&self, period_id: i64) -> ApiResult<Option<CalculationSummary>> {
        self.get_period(period_id)?;
        Ok(self.calculation_repo.find_summary(period_id)?)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn load_layout(&self) -> ApiResult<RoomLayout> {
        self.config_manager
            .get_room_layout()
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    fn build_engine(&self) -> ApiResult<AllocationEngine> {
        Ok(AllocationEngine::new(self.load_layout()?))
    }
}

/// 按房间配置顺序排序（不在配置内的房号排在最后，按房号）
pub(crate) fn sort_by_layout<T>(items: &mut [T], layout: &RoomLayout, room_of: impl Fn(&T) -> &str) {
    let position: HashMap<&str, usize> = layout
        .rooms()
        .iter()
        .enumerate()
        .map(|(idx, spec)| (spec.room.as_str(), idx))
        .collect();

    items.sort_by(|a, b| {
        let (ra, rb) = (room_of(a), room_of(b));
        let pa = position.get(ra).copied().unwrap_or(usize::MAX);
        let pb = position.get(rb).copied().unwrap_or(usize::MAX);
        pa.cmp(&pb).then_with(|| ra.cmp(rb))
    });
}
