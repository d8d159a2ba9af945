// ==========================================
// NSPIRE 合规系统 - 缺陷记录仓储
// ==========================================
// 职责: 管理 u_deficiency_item 表的 CRUD 操作
// 说明: 插入/更新前在同一事务内执行保存前钩子
// 红线: Repository 不含业务规则, 期限规则由钩子注入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::deficiency::DeficiencyItem;
use crate::domain::types::SaveOperation;
use crate::engine::hooks::PreSaveHook;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    deficiency_id, inspection_id, location, description, severity,
    correction_deadline, corrected_at, created_at, updated_at
"#;

/// 时间戳统一存为定宽 UTC RFC3339（纳秒）, 保证字符串比较与时间顺序一致
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// 解析时间戳列; 格式损坏时返回转换错误, 不静默丢弃
fn parse_ts(idx: usize, raw: &str) -> SqliteResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn get_ts(row: &Row<'_>, idx: usize) -> SqliteResult<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(idx, &raw)
}

fn get_opt_ts(row: &Row<'_>, idx: usize) -> SqliteResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_ts(idx, &s)).transpose()
}

fn map_row(row: &Row<'_>) -> SqliteResult<DeficiencyItem> {
    Ok(DeficiencyItem {
        deficiency_id: row.get(0)?,
        inspection_id: row.get(1)?,
        location: row.get(2)?,
        description: row.get(3)?,
        severity: row.get(4)?,
        correction_deadline: get_opt_ts(row, 5)?,
        corrected_at: get_opt_ts(row, 6)?,
        created_at: get_ts(row, 7)?,
        updated_at: get_ts(row, 8)?,
    })
}

fn not_found(id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "DeficiencyItem".to_string(),
        id: id.to_string(),
    }
}

// ==========================================
// DeficiencyRepository - 缺陷记录仓储
// ==========================================
pub struct DeficiencyRepository {
    conn: Arc<Mutex<Connection>>,
    hooks: Vec<Arc<dyn PreSaveHook>>,
}

impl DeficiencyRepository {
    /// 创建新的 DeficiencyRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self {
            conn,
            hooks: Vec::new(),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    /// 追加保存前钩子（构建器风格）
    pub fn with_hook(mut self, hook: Arc<dyn PreSaveHook>) -> Self {
        self.register_hook(hook);
        self
    }

    /// 追加保存前钩子, 按注册顺序执行
    pub fn register_hook(&mut self, hook: Arc<dyn PreSaveHook>) {
        tracing::debug!(hook = hook.name(), "注册保存前钩子");
        self.hooks.push(hook);
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS u_deficiency_item (
              deficiency_id TEXT PRIMARY KEY,
              inspection_id TEXT,
              location TEXT,
              description TEXT,
              severity TEXT,
              correction_deadline TEXT,
              corrected_at TEXT,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_deficiency_deadline
              ON u_deficiency_item(correction_deadline);

            CREATE INDEX IF NOT EXISTS idx_deficiency_inspection
              ON u_deficiency_item(inspection_id);
            "#,
        )?;
        Ok(())
    }

    fn run_hooks(&self, record: &mut DeficiencyItem, operation: SaveOperation) {
        for hook in &self.hooks {
            hook.before_save(record, operation);
        }
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 插入缺陷记录
    ///
    /// # 返回
    /// - Ok(DeficiencyItem): 钩子处理后实际写入的记录
    /// - Err(UniqueConstraintViolation): deficiency_id 已存在
    pub fn insert(&self, item: DeficiencyItem) -> RepositoryResult<DeficiencyItem> {
        let mut record = item;
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let now = Utc::now();
        record.created_at = now;
        record.updated_at = now;
        self.run_hooks(&mut record, SaveOperation::Insert);

        tx.execute(
            r#"
            INSERT INTO u_deficiency_item (
                deficiency_id, inspection_id, location, description, severity,
                correction_deadline, corrected_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.deficiency_id,
                record.inspection_id,
                record.location,
                record.description,
                record.severity,
                record.correction_deadline.as_ref().map(format_ts),
                record.corrected_at.as_ref().map(format_ts),
                format_ts(&record.created_at),
                format_ts(&record.updated_at),
            ],
        )?;
        tx.commit()?;

        tracing::info!(
            deficiency_id = %record.deficiency_id,
            severity = ?record.severity,
            correction_deadline = ?record.correction_deadline,
            "缺陷记录已插入"
        );
        Ok(record)
    }

    /// 更新缺陷记录（created_at 不变）
    ///
    /// # 返回
    /// - Ok(DeficiencyItem): 更新后的记录
    /// - Err(NotFound): 记录不存在
    pub fn update(&self, item: DeficiencyItem) -> RepositoryResult<DeficiencyItem> {
        let mut record = item;
        {
            let conn = self.get_conn()?;
            let tx = conn.unchecked_transaction()?;

            record.updated_at = Utc::now();
            self.run_hooks(&mut record, SaveOperation::Update);

            let affected = tx.execute(
                r#"
                UPDATE u_deficiency_item SET
                    inspection_id = ?2,
                    location = ?3,
                    description = ?4,
                    severity = ?5,
                    correction_deadline = ?6,
                    corrected_at = ?7,
                    updated_at = ?8
                WHERE deficiency_id = ?1
                "#,
                params![
                    record.deficiency_id,
                    record.inspection_id,
                    record.location,
                    record.description,
                    record.severity,
                    record.correction_deadline.as_ref().map(format_ts),
                    record.corrected_at.as_ref().map(format_ts),
                    format_ts(&record.updated_at),
                ],
            )?;

            if affected == 0 {
                return Err(not_found(&record.deficiency_id));
            }
            tx.commit()?;
        }

        tracing::info!(
            deficiency_id = %record.deficiency_id,
            severity = ?record.severity,
            correction_deadline = ?record.correction_deadline,
            "缺陷记录已更新"
        );
        self.find_by_id(&record.deficiency_id)?
            .ok_or_else(|| not_found(&record.deficiency_id))
    }

    /// 保存缺陷记录: 已存在则更新, 否则插入
    pub fn save(&self, item: DeficiencyItem) -> RepositoryResult<DeficiencyItem> {
        if self.exists(&item.deficiency_id)? {
            self.update(item)
        } else {
            self.insert(item)
        }
    }

    /// 标记已整改
    ///
    /// 不改变严重等级, 不触发保存前钩子;
    /// 已整改的记录保留首次整改时间, 重复调用不改写
    pub fn mark_corrected(&self, deficiency_id: &str, corrected_at: DateTime<Utc>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE u_deficiency_item
            SET corrected_at = ?2, updated_at = ?3
            WHERE deficiency_id = ?1
              AND corrected_at IS NULL
            "#,
            params![deficiency_id, format_ts(&corrected_at), format_ts(&Utc::now())],
        )?;

        if affected == 0 {
            let existing: Option<Option<String>> = conn
                .query_row(
                    "SELECT corrected_at FROM u_deficiency_item WHERE deficiency_id = ?1",
                    params![deficiency_id],
                    |row| row.get(0),
                )
                .optional()?;

            return match existing {
                Some(Some(first)) => {
                    tracing::debug!(deficiency_id, corrected_at = %first, "缺陷已整改, 保留首次整改时间");
                    Ok(())
                }
                _ => Err(not_found(deficiency_id)),
            };
        }
        tracing::info!(deficiency_id, corrected_at = %format_ts(&corrected_at), "缺陷已整改");
        Ok(())
    }

    /// 删除缺陷记录
    pub fn delete(&self, deficiency_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM u_deficiency_item WHERE deficiency_id = ?1",
            params![deficiency_id],
        )?;

        if affected == 0 {
            return Err(not_found(deficiency_id));
        }
        tracing::info!(deficiency_id, "缺陷记录已删除");
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 记录是否存在
    pub fn exists(&self, deficiency_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM u_deficiency_item WHERE deficiency_id = ?1",
                params![deficiency_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    /// 按 deficiency_id 查询
    ///
    /// # 返回
    /// - Ok(Some(DeficiencyItem)): 找到记录
    /// - Ok(None): 未找到记录
    pub fn find_by_id(&self, deficiency_id: &str) -> RepositoryResult<Option<DeficiencyItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM u_deficiency_item WHERE deficiency_id = ?1",
            SELECT_COLUMNS
        );
        let item = conn
            .query_row(&sql, params![deficiency_id], map_row)
            .optional()?;
        Ok(item)
    }

    /// 分页查询全部记录（按创建时间倒序）
    pub fn list_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<DeficiencyItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM u_deficiency_item
            ORDER BY created_at DESC, deficiency_id ASC
            LIMIT ?1 OFFSET ?2
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit, offset], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按检查查询
    pub fn list_by_inspection(&self, inspection_id: &str) -> RepositoryResult<Vec<DeficiencyItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM u_deficiency_item
            WHERE inspection_id = ?1
            ORDER BY deficiency_id ASC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![inspection_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询未整改的记录（按期限升序, 无期限排最后）
    pub fn list_open(&self) -> RepositoryResult<Vec<DeficiencyItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM u_deficiency_item
            WHERE corrected_at IS NULL
            ORDER BY correction_deadline IS NULL, correction_deadline ASC, deficiency_id ASC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询期限不晚于 instant 的未整改记录
    pub fn list_deadline_until(&self, instant: DateTime<Utc>) -> RepositoryResult<Vec<DeficiencyItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM u_deficiency_item
            WHERE corrected_at IS NULL
              AND correction_deadline IS NOT NULL
              AND correction_deadline <= ?1
            ORDER BY correction_deadline ASC, deficiency_id ASC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![format_ts(&instant)], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询期限落在 (from, to] 的未整改记录
    pub fn list_deadline_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<DeficiencyItem>> {
        if from >= to {
            return Ok(vec![]);
        }

        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM u_deficiency_item
            WHERE corrected_at IS NULL
              AND correction_deadline > ?1
              AND correction_deadline <= ?2
            ORDER BY correction_deadline ASC, deficiency_id ASC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![format_ts(&from), format_ts(&to)], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
