// ==========================================
// 租屋管理系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS）并记录 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;
use tracing::{info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys 与 busy_timeout 都需要"每个连接"单独设置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS electricity_period (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    year         INTEGER NOT NULL,
    month_start  INTEGER NOT NULL CHECK (month_start BETWEEN 1 AND 12),
    month_end    INTEGER NOT NULL CHECK (month_end BETWEEN 1 AND 12),
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (year, month_start, month_end)
);

CREATE TABLE IF NOT EXISTS electricity_master_bill (
    period_id   INTEGER NOT NULL REFERENCES electricity_period(id) ON DELETE CASCADE,
    label       TEXT NOT NULL,
    total_cost  REAL NOT NULL DEFAULT 0,
    total_kwh   REAL NOT NULL DEFAULT 0,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (period_id, label)
);

CREATE TABLE IF NOT EXISTS electricity_meter (
    period_id      INTEGER NOT NULL REFERENCES electricity_period(id) ON DELETE CASCADE,
    room           TEXT NOT NULL,
    start_reading  REAL NOT NULL DEFAULT 0,
    end_reading    REAL NOT NULL DEFAULT 0,
    updated_at     TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (period_id, room)
);

CREATE TABLE IF NOT EXISTS electricity_calculation (
    period_id    INTEGER NOT NULL REFERENCES electricity_period(id) ON DELETE CASCADE,
    room         TEXT NOT NULL,
    room_kind    TEXT NOT NULL,
    private_kwh  REAL NOT NULL,
    public_kwh   REAL NOT NULL,
    total_kwh    REAL NOT NULL,
    unit_price   REAL NOT NULL,
    fee          INTEGER NOT NULL,
    PRIMARY KEY (period_id, room)
);

CREATE TABLE IF NOT EXISTS electricity_calculation_summary (
    period_id           INTEGER PRIMARY KEY REFERENCES electricity_period(id) ON DELETE CASCADE,
    run_id              TEXT NOT NULL,
    unit_price          REAL NOT NULL,
    master_total_cost   REAL NOT NULL,
    master_total_kwh    REAL NOT NULL,
    shared_metered_kwh  REAL NOT NULL,
    public_kwh          REAL NOT NULL,
    public_per_room     REAL NOT NULL,
    total_fee           INTEGER NOT NULL,
    reason              TEXT NOT NULL,
    notes               TEXT,
    calculated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS electricity_payment (
    period_id       INTEGER NOT NULL REFERENCES electricity_period(id) ON DELETE CASCADE,
    room            TEXT NOT NULL,
    calculated_fee  INTEGER NOT NULL,
    paid_amount     INTEGER NOT NULL DEFAULT 0,
    status          TEXT NOT NULL DEFAULT 'UNPAID',
    payment_date    TEXT,
    notes           TEXT,
    updated_at      TEXT NOT NULL,
    PRIMARY KEY (period_id, room)
);
"#;

/// 建表并记录 schema_version（可重复调用）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    match read_schema_version(conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            warn!(
                db_version = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 高于程序版本"
            );
        }
        Some(v) if v == CURRENT_SCHEMA_VERSION => return Ok(()),
        _ => {}
    }

    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    info!(version = CURRENT_SCHEMA_VERSION, "数据库结构已初始化");
    Ok(())
}
