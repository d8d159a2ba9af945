// ==========================================
// NSPIRE 合规系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::DeficiencyApi;
use crate::config::config_manager::ConfigManager;
use crate::db::{ensure_base_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::clock::SystemClock;
use crate::engine::deadline::DeadlineEngine;
use crate::engine::hooks::CorrectionDeadlineHook;
use crate::i18n;
use crate::repository::deficiency_repo::DeficiencyRepository;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 缺陷API
    pub deficiency_api: Arc<DeficiencyApi<SystemClock>>,

    /// 整改期限引擎（供不落库的试算复用）
    pub deadline_engine: Arc<DeadlineEngine<SystemClock>>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建立基础表
    /// 2. 初始化引擎与保存前钩子
    /// 3. 初始化仓储并注册钩子
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_base_schema(&conn).map_err(|e| format!("基础表初始化失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(Some(v)) if v > CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    db_version = v,
                    expected = CURRENT_SCHEMA_VERSION,
                    "数据库 schema 版本高于当前程序"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("读取 schema_version 失败(将继续启动): {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 引擎与钩子
        // ==========================================
        let deadline_engine = Arc::new(DeadlineEngine::new());
        let deadline_hook = Arc::new(CorrectionDeadlineHook::new(deadline_engine.clone()));

        // ==========================================
        // 仓储与配置
        // ==========================================
        let deficiency_repo = DeficiencyRepository::from_connection(conn.clone())
            .map_err(|e| format!("无法初始化缺陷仓储: {}", e))?
            .with_hook(deadline_hook);
        let config_manager = ConfigManager::from_connection(conn)
            .map_err(|e| format!("无法初始化配置管理器: {}", e))?;

        let config_manager = Arc::new(config_manager);
        let deficiency_api = Arc::new(DeficiencyApi::new(
            Arc::new(deficiency_repo),
            deadline_engine.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            deficiency_api,
            deadline_engine,
            config_manager,
        })
    }

    /// 按 config_kv 中的 locale 切换界面语言
    ///
    /// 语言为进程级全局状态, 由入口显式调用
    pub fn apply_locale(&self) {
        match self.config_manager.get_locale() {
            Ok(locale) => i18n::set_locale(&locale),
            Err(e) => tracing::warn!("读取语言配置失败(使用默认语言): {}", e),
        }
    }
}

/// 获取默认数据库路径
///
/// 顺序:
/// 1) 环境变量 NSPIRE_COMPLIANCE_DB_PATH
/// 2) 用户数据目录 nspire-compliance/nspire_compliance.db
/// 3) 当前目录 ./nspire_compliance.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("NSPIRE_COMPLIANCE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./nspire_compliance.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("nspire-compliance");
        // best-effort: 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("nspire_compliance.db");
        }
    }

    path.to_string_lossy().to_string()
}
