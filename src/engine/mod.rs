// ==========================================
// NSPIRE 合规系统 - 引擎层
// ==========================================
// 职责: 整改期限规则、时钟、保存前钩子
// 红线: 引擎不直接访问数据库
// ==========================================

pub mod clock;
pub mod deadline;
pub mod hooks;

// 重导出核心引擎
pub use clock::{Clock, FixedClock, SystemClock};
pub use deadline::{
    calculate_deadline, deadline_for, DeadlineEngine, CORRECTION_WINDOW_DAYS,
    LIFE_THREATENING_WINDOW_SECS,
};
pub use hooks::{CorrectionDeadlineHook, PreSaveHook};
