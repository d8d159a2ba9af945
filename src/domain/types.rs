// ==========================================
// NSPIRE 合规系统 - 领域类型定义
// ==========================================
// 严重等级: HUD NSPIRE 缺陷分级
// 红线: 整改期限只由严重等级 + 当前时间决定
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 严重等级 (Severity)
// ==========================================
// 封闭枚举; 数据库中存储为小写下划线代码
// 顺序: Moderate < Severe < LifeThreatening
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,        // 中等
    Severe,          // 严重
    LifeThreatening, // 危及生命
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Severity {
    /// 从数据库代码解析严重等级
    ///
    /// 精确匹配 `life_threatening` / `severe` / `moderate`,
    /// 大小写不同、带空白或空字符串都返回 None
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "life_threatening" => Some(Severity::LifeThreatening),
            "severe" => Some(Severity::Severe),
            "moderate" => Some(Severity::Moderate),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Severity::LifeThreatening => "life_threatening",
            Severity::Severe => "severe",
            Severity::Moderate => "moderate",
        }
    }

    /// 国际化文案键
    pub fn label_key(&self) -> &'static str {
        match self {
            Severity::LifeThreatening => "severity.life_threatening",
            Severity::Severe => "severity.severe",
            Severity::Moderate => "severity.moderate",
        }
    }

    pub fn all() -> [Severity; 3] {
        [Severity::LifeThreatening, Severity::Severe, Severity::Moderate]
    }
}

// ==========================================
// 整改期限状态 (Deadline Status)
// ==========================================
// 驾驶舱/列表展示用, 由 DeadlineEngine::evaluate_status 判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadlineStatus {
    NoDeadline, // 未设定期限
    OnTrack,    // 期限充裕
    DueSoon,    // 临近期限
    Overdue,    // 已超期
    Corrected,  // 已整改
}

impl fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadlineStatus::NoDeadline => write!(f, "NO_DEADLINE"),
            DeadlineStatus::OnTrack => write!(f, "ON_TRACK"),
            DeadlineStatus::DueSoon => write!(f, "DUE_SOON"),
            DeadlineStatus::Overdue => write!(f, "OVERDUE"),
            DeadlineStatus::Corrected => write!(f, "CORRECTED"),
        }
    }
}

impl DeadlineStatus {
    pub fn label_key(&self) -> &'static str {
        match self {
            DeadlineStatus::NoDeadline => "status.no_deadline",
            DeadlineStatus::OnTrack => "status.on_track",
            DeadlineStatus::DueSoon => "status.due_soon",
            DeadlineStatus::Overdue => "status.overdue",
            DeadlineStatus::Corrected => "status.corrected",
        }
    }
}

// ==========================================
// 保存操作类型 (Save Operation)
// ==========================================
// 保存前钩子的触发时机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaveOperation {
    Insert,
    Update,
}

impl fmt::Display for SaveOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveOperation::Insert => write!(f, "INSERT"),
            SaveOperation::Update => write!(f, "UPDATE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_codes() {
        assert_eq!(Severity::parse("life_threatening"), Some(Severity::LifeThreatening));
        assert_eq!(Severity::parse("severe"), Some(Severity::Severe));
        assert_eq!(Severity::parse("moderate"), Some(Severity::Moderate));
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(Severity::parse(""), None);
        assert_eq!(Severity::parse("SEVERE"), None);
        assert_eq!(Severity::parse(" severe"), None);
        assert_eq!(Severity::parse("low"), None);
    }

    #[test]
    fn test_db_str_matches_parse() {
        for severity in Severity::all() {
            assert_eq!(Severity::parse(severity.to_db_str()), Some(severity));
            assert_eq!(severity.to_string(), severity.to_db_str());
        }
    }

    #[test]
    fn test_serde_codes() {
        let json = serde_json::to_string(&Severity::LifeThreatening).unwrap();
        assert_eq!(json, "\"life_threatening\"");

        let status = serde_json::to_string(&DeadlineStatus::DueSoon).unwrap();
        assert_eq!(status, "\"DUE_SOON\"");
    }
}
