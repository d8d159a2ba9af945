// ==========================================
// NSPIRE 合规系统 - 缺陷 API
// ==========================================
// 职责: 整改期限计算工具 + 缺陷记录管理
// 说明: 写操作经由 DeficiencyRepository, 由保存前钩子写入期限
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::deficiency::DeficiencyItem;
use crate::domain::types::{DeadlineStatus, Severity};
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::deadline::{DeadlineEngine, CORRECTION_WINDOW_DAYS};
use crate::engine::hooks::CorrectionDeadlineHook;
use crate::i18n;
use crate::repository::deficiency_repo::DeficiencyRepository;

// ==========================================
// 请求/响应对象
// ==========================================

/// 期限试算结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineQuote {
    pub severity: Option<String>,
    pub recognized: bool,
    pub deadline: Option<DateTime<Local>>,
    pub rule: String,
}

/// 新建缺陷请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDeficiencyRequest {
    /// 为空时自动生成 UUID
    pub deficiency_id: Option<String>,
    pub inspection_id: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
}

/// 更新缺陷请求（None 表示不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDeficiencyRequest {
    pub inspection_id: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// 传空字符串表示清除严重等级
    pub severity: Option<String>,
}

/// 缺陷展示对象（记录 + 文案 + 状态）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeficiencyView {
    #[serde(flatten)]
    pub item: DeficiencyItem,
    pub severity_label: String,
    pub status: DeadlineStatus,
    pub status_label: String,
}

/// 空字符串视为缺失
fn normalize_severity(severity: Option<String>) -> Option<String> {
    severity.filter(|s| !s.is_empty())
}

fn require_id(id: &str) -> ApiResult<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("缺陷ID不能为空".to_string()));
    }
    Ok(trimmed)
}

// ==========================================
// DeficiencyApi - 缺陷 API
// ==========================================

/// 缺陷API
///
/// 职责：
/// 1. 整改期限试算（表单/看板复用同一口径）
/// 2. 缺陷记录增改查
/// 3. 超期/临期清单
pub struct DeficiencyApi<C: Clock = SystemClock> {
    deficiency_repo: Arc<DeficiencyRepository>,
    deadline_engine: Arc<DeadlineEngine<C>>,
    config_manager: Arc<ConfigManager>,
}

impl<C: Clock + 'static> DeficiencyApi<C> {
    /// 创建新的DeficiencyApi实例
    ///
    /// # 参数
    /// - deficiency_repo: 缺陷仓储（应已注册 CorrectionDeadlineHook）
    /// - deadline_engine: 整改期限引擎
    /// - config_manager: 配置管理器
    pub fn new(
        deficiency_repo: Arc<DeficiencyRepository>,
        deadline_engine: Arc<DeadlineEngine<C>>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            deficiency_repo,
            deadline_engine,
            config_manager,
        }
    }

    /// 基于共享连接装配仓储、钩子与配置
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        deadline_engine: Arc<DeadlineEngine<C>>,
    ) -> ApiResult<Self> {
        let hook = Arc::new(CorrectionDeadlineHook::new(deadline_engine.clone()));
        let repo = DeficiencyRepository::from_connection(conn.clone())?.with_hook(hook);
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(repo), deadline_engine, Arc::new(config)))
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.deadline_engine.now().with_timezone(&Utc)
    }

    fn to_view(&self, item: DeficiencyItem, now: DateTime<Utc>) -> ApiResult<DeficiencyView> {
        let window = self
            .config_manager
            .get_due_soon_window()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let status = self.deadline_engine.evaluate_status(&item, now, window);

        Ok(DeficiencyView {
            severity_label: i18n::severity_label(item.severity.as_deref()),
            status,
            status_label: i18n::status_label(status),
            item,
        })
    }

    fn to_views(&self, items: Vec<DeficiencyItem>) -> ApiResult<Vec<DeficiencyView>> {
        let now = self.now_utc();
        items.into_iter().map(|item| self.to_view(item, now)).collect()
    }

    // ==========================================
    // 期限试算
    // ==========================================

    /// 按严重等级试算整改期限
    ///
    /// 不访问数据库; 与保存前钩子使用同一个 DeadlineEngine
    #[instrument(skip(self))]
    pub fn calculate_deadline(&self, severity: Option<&str>) -> DeadlineQuote {
        let level = severity.and_then(Severity::parse);
        let days = CORRECTION_WINDOW_DAYS.to_string();
        let rule = match level {
            Some(Severity::LifeThreatening) => i18n::t("rule.life_threatening"),
            Some(Severity::Severe) | Some(Severity::Moderate) => {
                i18n::t_with_args("rule.calendar_days", &[("days", days.as_str())])
            }
            None => i18n::t("rule.none"),
        };

        DeadlineQuote {
            severity: severity.map(|s| s.to_string()),
            recognized: level.is_some(),
            deadline: self.deadline_engine.calculate(severity),
            rule,
        }
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 新建缺陷
    #[instrument(skip(self, request), fields(severity = ?request.severity))]
    pub fn create_deficiency(&self, request: CreateDeficiencyRequest) -> ApiResult<DeficiencyView> {
        let deficiency_id = match request.deficiency_id.as_deref() {
            Some(id) => require_id(id)?.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };

        let mut item = DeficiencyItem::new(deficiency_id, None);
        item.inspection_id = request.inspection_id;
        item.location = request.location;
        item.description = request.description;
        item.severity = normalize_severity(request.severity);

        let saved = self.deficiency_repo.insert(item)?;
        info!(deficiency_id = %saved.deficiency_id, "新建缺陷");
        self.to_view(saved, self.now_utc())
    }

    /// 更新缺陷（每次保存都会按当前时间重新计算期限）
    #[instrument(skip(self, request))]
    pub fn update_deficiency(
        &self,
        deficiency_id: &str,
        request: UpdateDeficiencyRequest,
    ) -> ApiResult<DeficiencyView> {
        let id = require_id(deficiency_id)?;
        let mut item = self
            .deficiency_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(i18n::t_with_args("common.not_found", &[("id", id)])))?;

        if let Some(v) = request.inspection_id {
            item.inspection_id = Some(v);
        }
        if let Some(v) = request.location {
            item.location = Some(v);
        }
        if let Some(v) = request.description {
            item.description = Some(v);
        }
        if let Some(v) = request.severity {
            item.severity = normalize_severity(Some(v));
        }

        let saved = self.deficiency_repo.update(item)?;
        self.to_view(saved, self.now_utc())
    }

    /// 标记已整改
    #[instrument(skip(self))]
    pub fn mark_corrected(&self, deficiency_id: &str) -> ApiResult<DeficiencyView> {
        let id = require_id(deficiency_id)?;
        self.deficiency_repo.mark_corrected(id, self.now_utc())?;
        self.get_deficiency(id)
    }

    /// 删除缺陷
    #[instrument(skip(self))]
    pub fn delete_deficiency(&self, deficiency_id: &str) -> ApiResult<()> {
        let id = require_id(deficiency_id)?;
        self.deficiency_repo.delete(id)?;
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询单个缺陷
    pub fn get_deficiency(&self, deficiency_id: &str) -> ApiResult<DeficiencyView> {
        let id = require_id(deficiency_id)?;
        let item = self
            .deficiency_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(i18n::t_with_args("common.not_found", &[("id", id)])))?;
        self.to_view(item, self.now_utc())
    }

    /// 分页查询缺陷
    pub fn list_deficiencies(&self, limit: i64, offset: i64) -> ApiResult<Vec<DeficiencyView>> {
        if limit <= 0 || offset < 0 {
            return Err(ApiError::InvalidInput(format!(
                "分页参数无效: limit={}, offset={}",
                limit, offset
            )));
        }
        let items = self.deficiency_repo.list_all(limit, offset)?;
        self.to_views(items)
    }

    /// 按检查查询缺陷
    pub fn list_by_inspection(&self, inspection_id: &str) -> ApiResult<Vec<DeficiencyView>> {
        if inspection_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("检查ID不能为空".to_string()));
        }
        let items = self.deficiency_repo.list_by_inspection(inspection_id.trim())?;
        self.to_views(items)
    }

    /// 超期清单（未整改且期限不晚于当前时间）
    #[instrument(skip(self))]
    pub fn list_overdue(&self) -> ApiResult<Vec<DeficiencyView>> {
        let now = self.now_utc();
        let items = self.deficiency_repo.list_deadline_until(now)?;
        items.into_iter().map(|item| self.to_view(item, now)).collect()
    }

    /// 临期清单（未整改且期限落在 (now, now + 临期窗口]）
    #[instrument(skip(self))]
    pub fn list_due_soon(&self) -> ApiResult<Vec<DeficiencyView>> {
        let now = self.now_utc();
        let window = self
            .config_manager
            .get_due_soon_window()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let until = now
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let items = self.deficiency_repo.list_deadline_between(now, until)?;
        items.into_iter().map(|item| self.to_view(item, now)).collect()
    }
}
