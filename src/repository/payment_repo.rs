// ==========================================
// 租屋管理系统 - 电费缴费数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（状态由调用方推导）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::payment::ElectricityPayment;
use crate::domain::types::PaymentStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 电费缴费仓储
/// 职责: 管理 electricity_payment 表
pub struct PaymentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PaymentRepository {
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

    /// 查询期间的缴费记录（按房号排序）
    pub fn find_by_period(&self, period_id: i64) -> RepositoryResult<Vec<ElectricityPayment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT period_id, room, calculated_fee, paid_amount, status,
                   payment_date, notes, updated_at
            FROM electricity_payment
            WHERE period_id = ?1
            ORDER BY room
            "#,
        )?;

        let payments = stmt
            .query_map(params![period_id], map_payment_row)?
            .collect::<SqliteResult<Vec<ElectricityPayment>>>()?;

        Ok(payments)
    }

    /// 查询单笔缴费记录
    pub fn find(&self, period_id: i64, room: &str) -> RepositoryResult<Option<ElectricityPayment>> {
        let conn = self.get_conn()?;

        let payment = conn
            .query_row(
                r#"
                SELECT period_id, room, calculated_fee, paid_amount, status,
                       payment_date, notes, updated_at
                FROM electricity_payment
                WHERE period_id = ?1 AND room = ?2
                "#,
                params![period_id, room],
                map_payment_row,
            )
            .optional()?;

        Ok(payment)
    }

    /// 更新缴费信息（已缴金额 / 状态 / 日期 / 备注）
    ///
    /// # 返回
    /// - Err(NotFound): 记录不存在
    pub fn update_payment(&self, payment: &ElectricityPayment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE electricity_payment
            SET paid_amount = ?3,
                status = ?4,
                payment_date = ?5,
                notes = ?6,
                updated_at = ?7
            WHERE period_id = ?1 AND room = ?2
            "#,
            params![
                payment.period_id,
                payment.room,
                payment.paid_amount,
                payment.status.to_db_str(),
                payment.payment_date,
                payment.notes,
                payment.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ElectricityPayment".to_string(),
                id: format!("{}/{}", payment.period_id, payment.room),
            });
        }
        Ok(())
    }
}

fn map_payment_row(row: &Row<'_>) -> SqliteResult<ElectricityPayment> {
    Ok(ElectricityPayment {
        period_id: row.get(0)?,
        room: row.get(1)?,
        calculated_fee: row.get(2)?,
        paid_amount: row.get(3)?,
        status: PaymentStatus::from_str(&row.get::<_, String>(4)?),
        payment_date: row.get(5)?,
        notes: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
