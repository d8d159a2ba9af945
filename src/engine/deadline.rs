// ==========================================
// NSPIRE 合规系统 - 整改期限计算引擎
// ==========================================
// 规则 (HUD NSPIRE):
// - life_threatening → 当前时间 + 24 小时 (固定 86400 秒)
// - severe / moderate → 当前时间 + 30 天 (本地日历加天, 不是 30×24h)
// - 其他/缺失 → 不设期限
// ==========================================
// 红线: 期限只依赖严重等级与当前时间, 不读取也不修改任何其他状态
// ==========================================

use crate::domain::deficiency::DeficiencyItem;
use crate::domain::types::{DeadlineStatus, Severity};
use crate::engine::clock::{Clock, SystemClock};
use chrono::{DateTime, Days, Duration, LocalResult, TimeZone, Utc};
use tracing::{debug, instrument};

/// 危及生命缺陷的整改时限（秒）
pub const LIFE_THREATENING_WINDOW_SECS: i64 = 86_400;

/// 严重/中等缺陷的整改时限（日历天）
pub const CORRECTION_WINDOW_DAYS: u64 = 30;

// ==========================================
// 纯函数
// ==========================================

/// 按已识别的严重等级计算期限
///
/// 仅在 chrono 表示范围溢出时返回 None
pub fn deadline_for<Tz: TimeZone>(severity: Severity, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    match severity {
        Severity::LifeThreatening => {
            now.checked_add_signed(Duration::seconds(LIFE_THREATENING_WINDOW_SECS))
        }
        Severity::Severe | Severity::Moderate => add_local_days(now, CORRECTION_WINDOW_DAYS),
    }
}

/// 按严重等级代码计算期限
///
/// 缺失、空字符串、未识别的代码都返回 None（不是错误）
pub fn calculate_deadline<Tz: TimeZone>(
    severity: Option<&str>,
    now: DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let code = match severity {
        Some(s) if !s.is_empty() => s,
        _ => return None,
    };

    match Severity::parse(code) {
        Some(level) => deadline_for(level, now),
        None => {
            debug!(severity = code, "未识别的严重等级, 不设期限");
            None
        }
    }
}

/// 本地日历加天
///
/// 墙上时间保持不变, 日期前进 days 天:
/// - 夏令时回拨造成的重复时刻取较早者
/// - 夏令时跳变造成的不存在时刻退回固定时长相加
fn add_local_days<Tz: TimeZone>(now: DateTime<Tz>, days: u64) -> Option<DateTime<Tz>> {
    let target = now.naive_local().checked_add_days(Days::new(days))?;

    match now.timezone().from_local_datetime(&target) {
        LocalResult::Single(deadline) => Some(deadline),
        LocalResult::Ambiguous(earliest, _latest) => Some(earliest),
        LocalResult::None => now.checked_add_signed(Duration::days(days as i64)),
    }
}

// ==========================================
// DeadlineEngine - 整改期限引擎
// ==========================================
pub struct DeadlineEngine<C: Clock = SystemClock> {
    clock: C,
}

impl DeadlineEngine<SystemClock> {
    /// 创建使用系统时钟的引擎
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for DeadlineEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> DeadlineEngine<C> {
    /// 使用指定时钟创建引擎
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// 当前时间
    pub fn now(&self) -> DateTime<chrono::Local> {
        self.clock.now()
    }

    /// 计算整改期限（对外工具方法）
    ///
    /// 时钟只读取一次; 表单、列表、保存前钩子都走这里, 保证口径一致
    #[instrument(skip(self))]
    pub fn calculate(&self, severity: Option<&str>) -> Option<DateTime<chrono::Local>> {
        self.calculate_at(severity, self.clock.now())
    }

    /// 在指定时刻计算整改期限
    pub fn calculate_at<Tz: TimeZone>(
        &self,
        severity: Option<&str>,
        now: DateTime<Tz>,
    ) -> Option<DateTime<Tz>> {
        calculate_deadline(severity, now)
    }

    /// 判定缺陷的期限状态
    ///
    /// 顺序（命中即返回）:
    /// 1) 已整改 → Corrected
    /// 2) 无期限 → NoDeadline
    /// 3) deadline ≤ now → Overdue
    /// 4) deadline - now ≤ window → DueSoon
    /// 5) 其他 → OnTrack
    pub fn evaluate_status(
        &self,
        item: &DeficiencyItem,
        now: DateTime<Utc>,
        due_soon_window: Duration,
    ) -> DeadlineStatus {
        if item.is_corrected() {
            return DeadlineStatus::Corrected;
        }

        let deadline = match item.correction_deadline {
            Some(d) => d,
            None => return DeadlineStatus::NoDeadline,
        };

        if deadline <= now {
            DeadlineStatus::Overdue
        } else if deadline - now <= due_soon_window {
            DeadlineStatus::DueSoon
        } else {
            DeadlineStatus::OnTrack
        }
    }
}
