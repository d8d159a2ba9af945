// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、固定时钟与测试配置
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use nspire_compliance::db::{ensure_base_schema, open_sqlite_connection};
use nspire_compliance::engine::{CorrectionDeadlineHook, DeadlineEngine, FixedClock};
use nspire_compliance::repository::DeficiencyRepository;
use rusqlite::Connection;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化基础表
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    nspire_compliance::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_base_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 插入测试配置
pub fn insert_test_config(conn: &Connection, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

/// 测试基准时刻: 2026-01-17 01:30:00 UTC
pub fn base_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 17, 1, 30, 0).unwrap()
}

/// 固定在指定时刻的期限引擎
pub fn fixed_engine(instant: DateTime<Utc>) -> Arc<DeadlineEngine<FixedClock>> {
    Arc::new(DeadlineEngine::with_clock(FixedClock::from_utc(instant)))
}

/// 注册了期限钩子的仓储
pub fn repo_with_hook(
    db_path: &str,
    engine: Arc<DeadlineEngine<FixedClock>>,
) -> Result<DeficiencyRepository, Box<dyn Error>> {
    let conn = Arc::new(Mutex::new(open_test_connection(db_path)?));
    let repo = DeficiencyRepository::from_connection(conn)?
        .with_hook(Arc::new(CorrectionDeadlineHook::new(engine)));
    Ok(repo)
}
