// ==========================================
// NSPIRE 合规系统 - 时钟抽象
// ==========================================
// 职责: 为期限计算提供"当前时间"
// 说明: 生产使用 SystemClock, 测试注入 FixedClock
// ==========================================

use chrono::{DateTime, Local, Utc};

/// 时钟 Trait
pub trait Clock: Send + Sync {
    /// 当前时间（本地时区）
    fn now(&self) -> DateTime<Local>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// 固定时钟
///
/// 始终返回构造时给定的时刻
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Local>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Local>) -> Self {
        Self { instant }
    }

    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Self {
            instant: instant.with_timezone(&Local),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.instant
    }
}
