// ==========================================
// 租屋管理系统 - 公共电费分摊引擎
// ==========================================
// 职责: 台电单据 + 房间抄表 → 单价 / 公用电 / 各房电费
// 输入: MasterBill 列表 + MeterReading 列表 + RoomLayout（构造时注入）
// 输出: AllocationOutcome 或 AllocationError
// ==========================================
// 红线: 无 I/O、无内部状态，同样输入必得同样输出
// 红线: 单据校验、公用电为负时立即中止；抄表问题全部收集后一次报出
// 红线: 房间度数取 2 位小数，公用分摊与电费取整，两种精度不可合并
// ==========================================

use crate::domain::electricity::{
    AllocationOutcome, AllocationResult, MasterBill, MeterReading, ReadingViolation,
    ReadingViolationKind,
};
use crate::domain::room::RoomLayout;
use crate::domain::types::RoomKind;
use crate::i18n;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

// ==========================================
// AllocationError - 分摊计算错误
// ==========================================
/// 分摊计算错误（均为输入数据问题，重试无意义）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("没有有效的台电单据（金额与度数都需 > 0）")]
    NoValidMasterBill,

    #[error("抄表读数无效: {}", join_violations(.0))]
    InvalidMeterReading(Vec<ReadingViolation>),

    #[error("没有任何分摊房间的有效抄表读数")]
    NoValidMeterReadings,

    #[error("公用电度数为负: {public_kwh}（房间度数合计超过台电总度数）")]
    NegativePublicEnergy { public_kwh: f64 },
}

fn join_violations(violations: &[ReadingViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl AllocationError {
    /// 稳定的错误代码（供 API / 前端区分）
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::NoValidMasterBill => "NO_VALID_MASTER_BILL",
            AllocationError::InvalidMeterReading(_) => "INVALID_METER_READING",
            AllocationError::NoValidMeterReadings => "NO_VALID_METER_READINGS",
            AllocationError::NegativePublicEnergy { .. } => "NEGATIVE_PUBLIC_ENERGY",
        }
    }

    /// 面向使用者的本地化提示（按当前 locale）
    pub fn user_message(&self) -> String {
        match self {
            AllocationError::NoValidMasterBill => i18n::t("allocation.no_valid_master_bill"),
            AllocationError::InvalidMeterReading(violations) => {
                let details = violations
                    .iter()
                    .map(|v| {
                        i18n::t_with_args(
                            &format!("allocation.violation.{}", violation_key(v.kind)),
                            &[
                                ("room", v.room.as_str()),
                                ("start", &v.start_reading.to_string()),
                                ("end", &v.end_reading.to_string()),
                            ],
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                i18n::t_with_args(
                    "allocation.invalid_meter_reading",
                    &[
                        ("count", &violations.len().to_string()),
                        ("details", &details),
                    ],
                )
            }
            AllocationError::NoValidMeterReadings => i18n::t("allocation.no_valid_meter_readings"),
            AllocationError::NegativePublicEnergy { public_kwh } => i18n::t_with_args(
                "allocation.negative_public_energy",
                &[("public_kwh", &public_kwh.to_string())],
            ),
        }
    }
}

fn violation_key(kind: ReadingViolationKind) -> &'static str {
    match kind {
        ReadingViolationKind::EndBeforeStart => "end_before_start",
        ReadingViolationKind::Negative => "negative",
        ReadingViolationKind::NonFinite => "non_finite",
    }
}

// ==========================================
// 舍入规则
// ==========================================
// 银行家舍入 (round half to even)，与原账册的计算结果一致

/// 保留 2 位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// 取整
pub fn round0(value: f64) -> f64 {
    value.round_ties_even()
}

// ==========================================
// 阶段中间结果
// ==========================================

/// 台电单据汇总
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterTotals {
    pub total_cost: f64,
    pub total_kwh: f64,
    pub unit_price: f64,
}

/// 单个有度数的房间
#[derive(Debug, Clone, PartialEq)]
pub struct MeteredRoom {
    pub room: String,
    pub kind: RoomKind,
    pub private_kwh: f64,
}

/// 抄表汇总
#[derive(Debug, Clone, PartialEq)]
pub struct MeterAggregate {
    pub shared_metered_kwh: f64,   // 分摊房间度数合计
    pub valid_shared_rooms: usize, // 有度数的分摊房间数
    pub metered: Vec<MeteredRoom>, // 有度数的房间（按房间配置顺序）
}

/// 公用电计算结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublicEnergy {
    pub public_kwh: f64,
    pub public_per_room: f64,
}

// ==========================================
// AllocationEngine - 公共电费分摊引擎
// ==========================================
/// 公共电费分摊引擎
/// 职责: 校验输入、推导单价、分摊公用电、计算各房电费
/// 红线: 唯一持有的是只读的房间配置
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    layout: RoomLayout,
}

impl AllocationEngine {
    /// 构造函数
    ///
    /// # 参数
    /// - `layout`: 房间配置（已校验，至少一间分摊房间）
    pub fn new(layout: RoomLayout) -> Self {
        Self { layout }
    }

    /// 当前房间配置
    pub fn layout(&self) -> &RoomLayout {
        &self.layout
    }

    // ==========================================
    // 主流程
    // ==========================================

    /// 执行一次完整分摊
    ///
    /// # 参数
    /// - `bills`: 台电单据（可多张，例如按楼层）
    /// - `readings`: 房间抄表（缺少的房间视为未抄表）
    ///
    /// # 返回
    /// - Ok(AllocationOutcome): 单价、公用电与按房间顺序排列的结果
    /// - Err(AllocationError): 第一个失败阶段的错误
    pub fn allocate(
        &self,
        bills: &[MasterBill],
        readings: &[MeterReading],
    ) -> Result<AllocationOutcome, AllocationError> {
        let totals = self.derive_unit_price(bills)?;
        let aggregate = self.aggregate_meter_readings(readings)?;
        let public = self.compute_public_energy(totals.total_kwh, aggregate.shared_metered_kwh)?;
        let results =
            self.compute_room_fees(&aggregate.metered, public.public_per_room, totals.unit_price);

        debug!(
            unit_price = totals.unit_price,
            public_kwh = public.public_kwh,
            public_per_room = public.public_per_room,
            rooms = results.len(),
            "分摊计算完成"
        );

        Ok(AllocationOutcome {
            unit_price: totals.unit_price,
            master_total_cost: totals.total_cost,
            master_total_kwh: totals.total_kwh,
            shared_metered_kwh: aggregate.shared_metered_kwh,
            valid_shared_rooms: aggregate.valid_shared_rooms,
            public_kwh: public.public_kwh,
            public_per_room: public.public_per_room,
            results,
        })
    }

    // ==========================================
    // 阶段 1: 台电单据
    // ==========================================

    /// 校验台电单据并推导单价
    ///
    /// # 规则
    /// - 金额 ≤ 0 或度数 ≤ 0 的单据视为未填写，丢弃
    /// - 单价 = Σ金额 / Σ度数（仅有效单据）
    ///
    /// # 错误
    /// - 无有效单据 → NoValidMasterBill（在除法之前判定）
    pub fn derive_unit_price(&self, bills: &[MasterBill]) -> Result<MasterTotals, AllocationError> {
        let mut total_cost = 0.0;
        let mut total_kwh = 0.0;
        let mut usable = 0usize;

        for bill in bills {
            if bill.is_usable() {
                total_cost += bill.total_cost;
                total_kwh += bill.total_kwh;
                usable += 1;
            } else {
                debug!(label = %bill.label, "台电单据未填写完整，跳过");
            }
        }

        if usable == 0 || total_kwh <= 0.0 {
            return Err(AllocationError::NoValidMasterBill);
        }

        let unit_price = total_cost / total_kwh;
        debug!(usable, total_cost, total_kwh, unit_price, "台电单据汇总");

        Ok(MasterTotals {
            total_cost,
            total_kwh,
            unit_price,
        })
    }

    // ==========================================
    // 阶段 2: 房间抄表
    // ==========================================

    /// 校验并汇总房间抄表
    ///
    /// # 规则
    /// - 按房间配置逐间检查，输入中缺少的房间视为 (0, 0)
    /// - 本期 > 上期 → 度数 = round2(本期 - 上期)
    /// - 本期 == 上期 → 0 度，不算错误，不产生结果
    /// - 本期 < 上期、读数为负或非数值 → 记录违规，继续检查其余房间
    /// - 分摊房间度数逐间取 2 位小数后加总
    ///
    /// # 错误
    /// - 任一违规 → InvalidMeterReading（一次列出全部房间）
    /// - 无分摊房间有度数 → NoValidMeterReadings
    pub fn aggregate_meter_readings(
        &self,
        readings: &[MeterReading],
    ) -> Result<MeterAggregate, AllocationError> {
        let by_room = self.index_readings(readings);

        let mut violations = Vec::new();
        let mut metered = Vec::new();
        let mut shared_metered_kwh = 0.0;
        let mut valid_shared_rooms = 0usize;

        for spec in self.layout.rooms() {
            let (start, end) = by_room
                .get(spec.room.as_str())
                .map(|r| (r.start_reading, r.end_reading))
                .unwrap_or((0.0, 0.0));

            if let Some(kind) = classify_violation(start, end) {
                violations.push(ReadingViolation {
                    room: spec.room.clone(),
                    start_reading: start,
                    end_reading: end,
                    kind,
                });
                continue;
            }

            if end > start {
                let private_kwh = round2(end - start);
                if spec.kind == RoomKind::Shared {
                    shared_metered_kwh += private_kwh;
                    valid_shared_rooms += 1;
                }
                metered.push(MeteredRoom {
                    room: spec.room.clone(),
                    kind: spec.kind,
                    private_kwh,
                });
            }
        }

        if !violations.is_empty() {
            warn!(count = violations.len(), "抄表读数校验失败");
            return Err(AllocationError::InvalidMeterReading(violations));
        }

        if valid_shared_rooms == 0 {
            return Err(AllocationError::NoValidMeterReadings);
        }

        let shared_metered_kwh = round2(shared_metered_kwh);
        debug!(shared_metered_kwh, valid_shared_rooms, "房间抄表汇总");

        Ok(MeterAggregate {
            shared_metered_kwh,
            valid_shared_rooms,
            metered,
        })
    }

    /// 按房号建立索引（不在配置内的房号忽略，重复房号以后者为准）
    fn index_readings<'a>(&self, readings: &'a [MeterReading]) -> HashMap<&'a str, &'a MeterReading> {
        let mut by_room: HashMap<&str, &MeterReading> = HashMap::with_capacity(readings.len());
        for reading in readings {
            let room = reading.room.trim();
            if !self.layout.contains(room) {
                warn!(room = %reading.room, "房号不在房间配置中，忽略该读数");
                continue;
            }
            if by_room.insert(room, reading).is_some() {
                warn!(room, "同一房间有多笔读数，以最后一笔为准");
            }
        }
        by_room
    }

    // ==========================================
    // 阶段 3: 公用电
    // ==========================================

    /// 计算公用电与每间分摊房间的公用电
    ///
    /// # 规则
    /// - 公用电 = round2(台电总度数 - 分摊房间度数合计)
    /// - 每间分摊 = round0(公用电 / 配置中的分摊房间总数)
    ///   除数是配置的房间数，未抄表的分摊房间也占一份
    ///
    /// # 错误
    /// - 公用电 < 0 → NegativePublicEnergy（带上计算出的负值）
    pub fn compute_public_energy(
        &self,
        master_total_kwh: f64,
        shared_metered_kwh: f64,
    ) -> Result<PublicEnergy, AllocationError> {
        let public_kwh = round2(master_total_kwh - shared_metered_kwh);
        if public_kwh < 0.0 {
            warn!(public_kwh, master_total_kwh, shared_metered_kwh, "公用电度数为负");
            return Err(AllocationError::NegativePublicEnergy { public_kwh });
        }

        let shared_count = self.layout.shared_count().max(1);
        let public_per_room = round0(public_kwh / shared_count as f64);

        Ok(PublicEnergy {
            public_kwh,
            public_per_room,
        })
    }

    // ==========================================
    // 阶段 4: 各房电费
    // ==========================================

    /// 计算各房电费
    ///
    /// # 规则
    /// - 独立房间: 总度数 = 房间度数
    /// - 分摊房间: 总度数 = round2(房间度数 + 每间公用电)
    /// - 电费 = round0(总度数 × 单价)
    pub fn compute_room_fees(
        &self,
        metered: &[MeteredRoom],
        public_per_room: f64,
        unit_price: f64,
    ) -> Vec<AllocationResult> {
        metered
            .iter()
            .map(|m| {
                let (public_kwh, total_kwh) = match m.kind {
                    RoomKind::Exclusive => (0.0, m.private_kwh),
                    RoomKind::Shared => (public_per_room, round2(m.private_kwh + public_per_room)),
                };
                AllocationResult {
                    room: m.room.clone(),
                    kind: m.kind,
                    private_kwh: m.private_kwh,
                    public_kwh,
                    total_kwh,
                    unit_price,
                    fee: round0(total_kwh * unit_price) as i64,
                }
            })
            .collect()
    }

    // ==========================================
    // 可解释性方法
    // ==========================================

    /// 生成计算说明（JSON，随摘要保存）
    pub fn generate_reason(&self, outcome: &AllocationOutcome) -> String {
        let unread: Vec<&str> = self
            .layout
            .rooms()
            .iter()
            .map(|s| s.room.as_str())
            .filter(|room| outcome.result_for(room).is_none())
            .collect();

        json!({
            "unit_price": outcome.unit_price,
            "master_total_cost": outcome.master_total_cost,
            "master_total_kwh": outcome.master_total_kwh,
            "shared_metered_kwh": outcome.shared_metered_kwh,
            "public_kwh": outcome.public_kwh,
            "shared_room_count": self.layout.shared_count(),
            "public_per_room": outcome.public_per_room,
            "valid_shared_rooms": outcome.valid_shared_rooms,
            "billed_rooms": outcome.results.len(),
            "unread_rooms": unread,
            "total_fee": outcome.total_fee(),
        })
        .to_string()
    }
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(RoomLayout::default())
    }
}

/// 单间读数的违规类型（无问题返回 None）
fn classify_violation(start: f64, end: f64) -> Option<ReadingViolationKind> {
    if !start.is_finite() || !end.is_finite() {
        Some(ReadingViolationKind::NonFinite)
    } else if start < 0.0 || end < 0.0 {
        Some(ReadingViolationKind::Negative)
    } else if end < start {
        Some(ReadingViolationKind::EndBeforeStart)
    } else {
        None
    }
}
