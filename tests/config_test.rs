// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取、默认值回退与快照恢复
// ==========================================

mod test_helpers;

use chrono::Duration;
use nspire_compliance::config::{
    config_keys, ConfigManager, DEFAULT_DUE_SOON_WINDOW_HOURS, DEFAULT_LOCALE,
};
use test_helpers::{create_test_db, insert_test_config, open_test_connection};

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_defaults_when_unset() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(
        config_manager.get_due_soon_window().unwrap(),
        Duration::hours(DEFAULT_DUE_SOON_WINDOW_HOURS)
    );
    assert_eq!(config_manager.get_locale().unwrap(), DEFAULT_LOCALE);
}

#[test]
fn test_due_soon_window_from_db() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn, config_keys::DUE_SOON_WINDOW_HOURS, "48")
        .expect("Failed to insert test config");

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    assert_eq!(config_manager.get_due_soon_window().unwrap(), Duration::hours(48));
}

#[test]
fn test_invalid_values_fall_back() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    for raw in ["0", "-12", "three days", "", "2400000000", "9000000000000000"] {
        config_manager
            .set_global_config_value(config_keys::DUE_SOON_WINDOW_HOURS, raw)
            .unwrap();
        assert_eq!(
            config_manager.get_due_soon_window().unwrap(),
            Duration::hours(DEFAULT_DUE_SOON_WINDOW_HOURS),
            "非法窗口值 {:?} 应回退默认值",
            raw
        );
    }

    config_manager
        .set_global_config_value(config_keys::LOCALE, "fr")
        .unwrap();
    assert_eq!(config_manager.get_locale().unwrap(), DEFAULT_LOCALE);

    config_manager
        .set_global_config_value(config_keys::LOCALE, "en")
        .unwrap();
    assert_eq!(config_manager.get_locale().unwrap(), "en");
}

#[test]
fn test_snapshot_and_restore() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::DUE_SOON_WINDOW_HOURS, "24")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::LOCALE, "en")
        .unwrap();
    let snapshot = config_manager.get_config_snapshot().unwrap();

    config_manager
        .set_global_config_value(config_keys::DUE_SOON_WINDOW_HOURS, "96")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::LOCALE, "zh-CN")
        .unwrap();

    let restored = config_manager.restore_config_from_snapshot(&snapshot).unwrap();
    assert_eq!(restored, 2);
    assert_eq!(config_manager.get_due_soon_window().unwrap(), Duration::hours(24));
    assert_eq!(config_manager.get_locale().unwrap(), "en");
}
