// ==========================================
// NSPIRE 合规系统 - 缺陷领域模型
// ==========================================
// 对齐: u_deficiency_item 表
// 红线: correction_deadline 只允许由保存前钩子写入
// ==========================================

use crate::domain::types::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// DeficiencyItem - 缺陷记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeficiencyItem {
    // ===== 主键 =====
    pub deficiency_id: String, // 缺陷ID

    // ===== 检查信息 =====
    pub inspection_id: Option<String>, // 所属检查
    pub location: Option<String>,      // 位置 (单元/楼栋/场地)
    pub description: Option<String>,   // 缺陷描述

    // ===== 分级 =====
    // 保留原始录入值, 未识别的等级也原样入库
    pub severity: Option<String>,

    // ===== 派生字段 =====
    pub correction_deadline: Option<DateTime<Utc>>, // 整改期限
    pub corrected_at: Option<DateTime<Utc>>,        // 整改完成时间

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeficiencyItem {
    /// 创建新的缺陷记录 (未入库, 期限待钩子计算)
    pub fn new(deficiency_id: impl Into<String>, severity: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            deficiency_id: deficiency_id.into(),
            inspection_id: None,
            location: None,
            description: None,
            severity: severity.map(|s| s.to_string()),
            correction_deadline: None,
            corrected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 已识别的严重等级
    pub fn severity_level(&self) -> Option<Severity> {
        self.severity.as_deref().and_then(Severity::parse)
    }

    /// 是否已整改
    pub fn is_corrected(&self) -> bool {
        self.corrected_at.is_some()
    }
}
