// ==========================================
// NSPIRE 合规系统 - 保存前钩子
// ==========================================
// 职责: 定义缺陷记录的保存前钩子 trait
// 说明: Engine 层定义 trait, Repository 层在写库前调用
// 时机: 插入/更新之前, 写入提交之前
// ==========================================

use crate::domain::deficiency::DeficiencyItem;
use crate::domain::types::SaveOperation;
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::deadline::DeadlineEngine;
use chrono::Utc;
use std::sync::Arc;

// ==========================================
// 保存前钩子 Trait
// ==========================================

/// 缺陷记录保存前钩子
///
/// 仓储在同一写事务内、执行 SQL 之前调用,
/// 钩子对记录的修改会随本次写入一并落库
pub trait PreSaveHook: Send + Sync {
    /// 钩子名称（用于日志）
    fn name(&self) -> &str;

    /// 保存前处理
    ///
    /// # 参数
    /// - `record`: 即将写入的记录
    /// - `operation`: 插入或更新
    fn before_save(&self, record: &mut DeficiencyItem, operation: SaveOperation);
}

// ==========================================
// CorrectionDeadlineHook - 整改期限钩子
// ==========================================

/// 写库前按严重等级计算 correction_deadline
///
/// - 严重等级缺失/为空: 直接返回, 记录不变
/// - 已识别等级: 用 DeadlineEngine 计算并写入
/// - 未识别等级: 不产生期限, 字段保持原值
pub struct CorrectionDeadlineHook<C: Clock = SystemClock> {
    engine: Arc<DeadlineEngine<C>>,
}

impl<C: Clock> CorrectionDeadlineHook<C> {
    pub fn new(engine: Arc<DeadlineEngine<C>>) -> Self {
        Self { engine }
    }
}

impl<C: Clock> PreSaveHook for CorrectionDeadlineHook<C> {
    fn name(&self) -> &str {
        "calculate_correction_deadline"
    }

    fn before_save(&self, record: &mut DeficiencyItem, operation: SaveOperation) {
        let severity = match record.severity.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => return,
        };

        match self.engine.calculate(Some(severity)) {
            Some(deadline) => {
                let deadline = deadline.with_timezone(&Utc);
                tracing::debug!(
                    deficiency_id = %record.deficiency_id,
                    severity,
                    %operation,
                    deadline = %deadline.to_rfc3339(),
                    "写入整改期限"
                );
                record.correction_deadline = Some(deadline);
            }
            None => {
                tracing::debug!(
                    deficiency_id = %record.deficiency_id,
                    severity,
                    %operation,
                    "严重等级未识别, 保留原期限"
                );
            }
        }
    }
}
