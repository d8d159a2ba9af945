// ==========================================
// NSPIRE 合规系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod deficiency;
pub mod types;

// 重导出核心类型
pub use deficiency::DeficiencyItem;
pub use types::{DeadlineStatus, SaveOperation, Severity};
