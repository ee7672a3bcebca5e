// ==========================================
// 租屋管理系统 - 分摊结果数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 写入语义: 同一期间重新计算时整批替换（在同一事务内）
//   - electricity_calculation: 先删后插，已不在结果中的房间随之移除
//   - electricity_calculation_summary: 覆写
//   - electricity_payment: 在同一事务内读取已缴金额，重算应缴与状态后 UPSERT
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::electricity::{AllocationResult, CalculationSummary};
use crate::domain::types::{PaymentStatus, RoomKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 分摊结果仓储
/// 职责: 管理 electricity_calculation / electricity_calculation_summary 表
pub struct CalculationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CalculationRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存一次计算（结果 + 摘要 + 缴费记录）
    ///
    /// # 参数
    /// - period_id: 期间ID
    /// - results: 分摊结果
    /// - summary: 计算摘要（calculated_at 同时作为缴费记录的更新时间）
    ///
    /// # 规则
    /// - 缴费记录的已缴金额 / 日期 / 备注保持不变
    /// - 应缴改为本次电费，状态按 PaymentStatus::derive 重新推导
    /// - 已读取的已缴金额与写入在同一事务内，不会被并发登记覆盖
    ///
    /// # 返回
    /// - Ok(usize): 写入的结果行数
    pub fn save_calculation(
        &self,
        period_id: i64,
        results: &[AllocationResult],
        summary: &CalculationSummary,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM electricity_calculation WHERE period_id = ?1",
            params![period_id],
        )?;

        let mut count = 0;
        for r in results {
            count += tx.execute(
                r#"
                INSERT INTO electricity_calculation (
                    period_id, room, room_kind, private_kwh, public_kwh,
                    total_kwh, unit_price, fee
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    period_id,
                    r.room,
                    r.kind.to_db_str(),
                    r.private_kwh,
                    r.public_kwh,
                    r.total_kwh,
                    r.unit_price,
                    r.fee,
                ],
            )?;
        }

        tx.execute(
            r#"
            INSERT OR REPLACE INTO electricity_calculation_summary (
                period_id, run_id, unit_price, master_total_cost, master_total_kwh,
                shared_metered_kwh, public_kwh, public_per_room, total_fee,
                reason, notes, calculated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                period_id,
                summary.run_id,
                summary.unit_price,
                summary.master_total_cost,
                summary.master_total_kwh,
                summary.shared_metered_kwh,
                summary.public_kwh,
                summary.public_per_room,
                summary.total_fee,
                summary.reason,
                summary.notes,
                summary.calculated_at,
            ],
        )?;

        for r in results {
            let paid_amount: i64 = tx
                .query_row(
                    r#"
                    SELECT paid_amount FROM electricity_payment
                    WHERE period_id = ?1 AND room = ?2
                    "#,
                    params![period_id, r.room],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or(0);

            tx.execute(
                r#"
                INSERT INTO electricity_payment (
                    period_id, room, calculated_fee, paid_amount, status,
                    payment_date, notes, updated_at
                ) VALUES (?1, ?2, ?3, 0, ?4, NULL, NULL, ?5)
                ON CONFLICT(period_id, room) DO UPDATE SET
                    calculated_fee = excluded.calculated_fee,
                    status = excluded.status,
                    updated_at = excluded.updated_at
                "#,
                params![
                    period_id,
                    r.room,
                    r.fee,
                    PaymentStatus::derive(r.fee, paid_amount).to_db_str(),
                    summary.calculated_at,
                ],
            )?;
        }

        // 已不在结果中且尚未收款的房间，移除其缴费记录
        tx.execute(
            r#"
            DELETE FROM electricity_payment
            WHERE period_id = ?1
              AND paid_amount = 0
              AND room NOT IN (SELECT room FROM electricity_calculation WHERE period_id = ?1)
            "#,
            params![period_id],
        )?;

        tx.commit()?;
        Ok(count)
    }

    /// 查询期间的分摊结果（按房号排序）
    pub fn find_results(&self, period_id: i64) -> RepositoryResult<Vec<AllocationResult>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT room, room_kind, private_kwh, public_kwh, total_kwh, unit_price, fee
            FROM electricity_calculation
            WHERE period_id = ?1
            ORDER BY room
            "#,
        )?;

        let results = stmt
            .query_map(params![period_id], |row| {
                let kind_str: String = row.get(1)?;
                let kind = RoomKind::from_str(&kind_str).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        Type::Text,
                        format!("未知房间分类: {}", kind_str).into(),
                    )
                })?;
                Ok(AllocationResult {
                    room: row.get(0)?,
                    kind,
                    private_kwh: row.get(2)?,
                    public_kwh: row.get(3)?,
                    total_kwh: row.get(4)?,
                    unit_price: row.get(5)?,
                    fee: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<AllocationResult>>>()?;

        Ok(results)
    }

    /// 查询期间的计算摘要
    pub fn find_summary(&self, period_id: i64) -> RepositoryResult<Option<CalculationSummary>> {
        let conn = self.get_conn()?;

        let summary = conn
            .query_row(
                r#"
                SELECT period_id, run_id, unit_price, master_total_cost, master_total_kwh,
                       shared_metered_kwh, public_kwh, public_per_room, total_fee,
                       reason, notes, calculated_at
                FROM electricity_calculation_summary
                WHERE period_id = ?1
                "#,
                params![period_id],
                |row| {
                    Ok(CalculationSummary {
                        period_id: row.get(0)?,
                        run_id: row.get(1)?,
                        unit_price: row.get(2)?,
                        master_total_cost: row.get(3)?,
                        master_total_kwh: row.get(4)?,
                        shared_metered_kwh: row.get(5)?,
                        public_kwh: row.get(6)?,
                        public_per_room: row.get(7)?,
                        total_fee: row.get(8)?,
                        reason: row.get(9)?,
                        notes: row.get(10)?,
                        calculated_at: row.get(11)?,
                    })
                },
            )
            .optional()?;

        Ok(summary)
    }
}
