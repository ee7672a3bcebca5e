// ==========================================
// 租屋管理系统 - 台电单据 / 房间抄表数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（不校验读数）
// 写入语义: 按 (期间, 标签) / (期间, 房号) UPSERT
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::electricity::{MasterBill, MeterReading};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 电费输入仓储
/// 职责: 管理 electricity_master_bill / electricity_meter 表
pub struct ElectricityReadingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ElectricityReadingRepository {
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

    // ==========================================
    // 台电单据
    // ==========================================

    /// 批量保存台电单据
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    pub fn upsert_master_bills(&self, period_id: i64, bills: &[MasterBill]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for bill in bills {
            count += tx.execute(
                r#"
                INSERT INTO electricity_master_bill (period_id, label, total_cost, total_kwh, updated_at)
                VALUES (?1, ?2, ?3, ?4, datetime('now'))
                ON CONFLICT(period_id, label) DO UPDATE SET
                    total_cost = excluded.total_cost,
                    total_kwh = excluded.total_kwh,
                    updated_at = excluded.updated_at
                "#,
                params![period_id, bill.label.trim(), bill.total_cost, bill.total_kwh],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询期间的台电单据（按标签排序）
    pub fn find_master_bills(&self, period_id: i64) -> RepositoryResult<Vec<MasterBill>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT label, total_cost, total_kwh
            FROM electricity_master_bill
            WHERE period_id = ?1
            ORDER BY label
            "#,
        )?;

        let bills = stmt
            .query_map(params![period_id], |row| {
                Ok(MasterBill {
                    label: row.get(0)?,
                    total_cost: row.get(1)?,
                    total_kwh: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<MasterBill>>>()?;

        Ok(bills)
    }

    // ==========================================
    // 房间抄表
    // ==========================================

    /// 批量保存房间抄表
    pub fn upsert_meter_readings(
        &self,
        period_id: i64,
        readings: &[MeterReading],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for reading in readings {
            count += tx.execute(
                r#"
                INSERT INTO electricity_meter (period_id, room, start_reading, end_reading, updated_at)
                VALUES (?1, ?2, ?3, ?4, datetime('now'))
                ON CONFLICT(period_id, room) DO UPDATE SET
                    start_reading = excluded.start_reading,
                    end_reading = excluded.end_reading,
                    updated_at = excluded.updated_at
                "#,
                params![
                    period_id,
                    reading.room.trim(),
                    reading.start_reading,
                    reading.end_reading
                ],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询期间的房间抄表（按房号排序，输出顺序由引擎按房间配置决定）
    pub fn find_meter_readings(&self, period_id: i64) -> RepositoryResult<Vec<MeterReading>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT room, start_reading, end_reading
            FROM electricity_meter
            WHERE period_id = ?1
            ORDER BY room
            "#,
        )?;

        let readings = stmt
            .query_map(params![period_id], |row| {
                Ok(MeterReading {
                    room: row.get(0)?,
                    start_reading: row.get(1)?,
                    end_reading: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<MeterReading>>>()?;

        Ok(readings)
    }
}
