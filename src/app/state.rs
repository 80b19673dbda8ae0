// ==========================================
// 车队维保系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ImportApi, MatrixApi, PlanApi};
use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::repository::SqlitePlanRepository;

/// 应用状态
///
/// 计划API与矩阵API共享同一个连接；导入API按调用创建导入器
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 保养计划导入API
    pub import_api: Arc<ImportApi>,

    /// 保养计划API
    pub plan_api: Arc<PlanApi<SqlitePlanRepository>>,

    /// 适用矩阵API
    pub matrix_api: Arc<MatrixApi<SqlitePlanRepository>>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 返回
    /// - Err(String): 数据库打开或建表失败
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let plan_repo = Arc::new(
            SqlitePlanRepository::from_connection(conn.clone())
                .map_err(|e| format!("初始化计划仓储失败: {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("初始化配置管理器失败: {}", e))?,
        );

        Ok(Self {
            import_api: Arc::new(ImportApi::new(db_path.clone())),
            plan_api: Arc::new(PlanApi::new(plan_repo.clone())),
            matrix_api: Arc::new(MatrixApi::new(plan_repo)),
            config_manager,
            db_path,
        })
    }
}

/// 默认数据库路径
///
/// 优先使用环境变量 FLEET_MAINTENANCE_DB_PATH，其次为用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("FLEET_MAINTENANCE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fleet_maintenance.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("fleet-maintenance-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("fleet-maintenance");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("fleet_maintenance.db");
        }
    }

    path.to_string_lossy().to_string()
}
