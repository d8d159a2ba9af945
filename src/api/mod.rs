// ==========================================
// NSPIRE 合规系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI/上层应用调用
// ==========================================

pub mod deficiency_api;
pub mod error;

// 重导出核心类型
pub use deficiency_api::{
    CreateDeficiencyRequest, DeadlineQuote, DeficiencyApi, DeficiencyView, UpdateDeficiencyRequest,
};
pub use error::{ApiError, ApiResult, ErrorResponse};
