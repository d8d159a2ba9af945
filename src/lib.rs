// ==========================================
// NSPIRE 合规系统 - 核心库
// ==========================================
// 职责: 按缺陷严重等级计算整改期限, 并在缺陷记录写库前写入
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 期限规则与保存前钩子
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{DeadlineStatus, DeficiencyItem, SaveOperation, Severity};

pub use engine::{
    calculate_deadline, Clock, CorrectionDeadlineHook, DeadlineEngine, FixedClock, PreSaveHook,
    SystemClock,
};

pub use repository::{DeficiencyRepository, RepositoryError, RepositoryResult};

pub use api::{ApiError, ApiResult, DeficiencyApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "NSPIRE 合规整改期限系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
