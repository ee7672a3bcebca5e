// ==========================================
// 租屋管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ElectricityApi, PaymentApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    calculation_repo::CalculationRepository, payment_repo::PaymentRepository,
    period_repo::ElectricityPeriodRepository, reading_repo::ElectricityReadingRepository,
};

/// 应用状态
///
/// 所有仓储共用一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 电费分摊API
    pub electricity_api: Arc<ElectricityApi>,

    /// 电费缴费API
    pub payment_api: Arc<PaymentApi>,

    /// 配置管理器（房间配置等）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let period_repo = Arc::new(ElectricityPeriodRepository::from_connection(conn.clone()));
        let reading_repo = Arc::new(ElectricityReadingRepository::from_connection(conn.clone()));
        let calculation_repo = Arc::new(CalculationRepository::from_connection(conn.clone()));
        let payment_repo = Arc::new(PaymentRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let electricity_api = Arc::new(ElectricityApi::new(
            period_repo.clone(),
            reading_repo,
            calculation_repo,
            payment_repo.clone(),
            config_manager.clone(),
        ));
        let payment_api = Arc::new(PaymentApi::new(
            period_repo,
            payment_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            electricity_api,
            payment_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// # 规则
/// 1. 环境变量 RENTAL_BILLING_DB_PATH（非空）
/// 2. 用户数据目录/rental-billing/rental_billing.db
/// 3. ./rental_billing.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("RENTAL_BILLING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./rental_billing.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("rental-billing");
        // 目录建不起来就退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("rental_billing.db");
        }
    }

    path.to_string_lossy().to_string()
}
