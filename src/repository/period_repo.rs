// ==========================================
// 租屋管理系统 - 计费期间数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::electricity::{BillingPeriod, ElectricityPeriod};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ElectricityPeriodRepository - 计费期间仓储
// ==========================================

/// 计费期间仓储
/// 职责: 管理 electricity_period 表
pub struct ElectricityPeriodRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ElectricityPeriodRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查找或创建计费期间
    ///
    /// # 返回
    /// - Ok(i64): 期间ID（已存在时返回原有ID）
    pub fn find_or_create(&self, period: &BillingPeriod) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT OR IGNORE INTO electricity_period (year, month_start, month_end)
            VALUES (?1, ?2, ?3)
            "#,
            params![period.year, period.month_start, period.month_end],
        )?;

        let id = conn.query_row(
            r#"
            SELECT id FROM electricity_period
            WHERE year = ?1 AND month_start = ?2 AND month_end = ?3
            "#,
            params![period.year, period.month_start, period.month_end],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    /// 按ID查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ElectricityPeriod>> {
        let conn = self.get_conn()?;

        let period = conn
            .query_row(
                r#"
                SELECT id, year, month_start, month_end, created_at
                FROM electricity_period
                WHERE id = ?1
                "#,
                params![id],
                map_period_row,
            )
            .optional()?;

        Ok(period)
    }

    /// 按年份与月份查询
    pub fn find_by_period(&self, period: &BillingPeriod) -> RepositoryResult<Option<ElectricityPeriod>> {
        let conn = self.get_conn()?;

        let found = conn
            .query_row(
                r#"
                SELECT id, year, month_start, month_end, created_at
                FROM electricity_period
                WHERE year = ?1 AND month_start = ?2 AND month_end = ?3
                "#,
                params![period.year, period.month_start, period.month_end],
                map_period_row,
            )
            .optional()?;

        Ok(found)
    }

    /// 列出全部期间（新的在前）
    pub fn list_all(&self) -> RepositoryResult<Vec<ElectricityPeriod>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, year, month_start, month_end, created_at
            FROM electricity_period
            ORDER BY year DESC, month_start DESC, id DESC
            "#,
        )?;

        let periods = stmt
            .query_map([], map_period_row)?
            .collect::<SqliteResult<Vec<ElectricityPeriod>>>()?;

        Ok(periods)
    }

    /// 删除期间（单据、读数、结果、缴费记录级联删除）
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM electricity_period WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ElectricityPeriod".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_period_row(row: &Row<'_>) -> SqliteResult<ElectricityPeriod> {
    Ok(ElectricityPeriod {
        id: row.get(0)?,
        period: BillingPeriod {
            year: row.get(1)?,
            month_start: row.get(2)?,
            month_end: row.get(3)?,
        },
        created_at: row.get(4)?,
    })
}
