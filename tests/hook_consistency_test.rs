// ==========================================
// 试算工具与保存前钩子一致性测试
// ==========================================
// 测试目标: 同一严重等级、同一时刻下, 试算结果与落库期限完全相同
// ==========================================

mod test_helpers;

use chrono::{Duration, TimeZone, Utc};
use nspire_compliance::domain::DeficiencyItem;
use nspire_compliance::engine::{calculate_deadline, LIFE_THREATENING_WINDOW_SECS};
use test_helpers::{base_instant, create_test_db, fixed_engine, repo_with_hook};

#[test]
fn test_utility_and_hook_agree_for_every_level() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let engine = fixed_engine(base_instant());
    let repo = repo_with_hook(&db_path, engine.clone()).expect("Failed to create repo");

    for (i, severity) in ["life_threatening", "severe", "moderate"].into_iter().enumerate() {
        let quoted = engine.calculate(Some(severity)).map(|d| d.with_timezone(&Utc));
        assert!(quoted.is_some(), "{} 应产生期限", severity);

        let saved = repo
            .insert(DeficiencyItem::new(format!("DEF_{}", i), Some(severity)))
            .expect("insert failed");
        assert_eq!(saved.correction_deadline, quoted, "{} 钩子结果与试算不一致", severity);

        // 重新读库后仍一致（纳秒精度无损）
        let reloaded = repo.find_by_id(&saved.deficiency_id).unwrap().unwrap();
        assert_eq!(reloaded.correction_deadline, quoted);
    }
}

#[test]
fn test_life_threatening_is_exactly_one_day_after_save() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let now = Utc.with_ymd_and_hms(2026, 3, 8, 6, 59, 59).unwrap() + Duration::nanoseconds(123_456_789);
    let repo = repo_with_hook(&db_path, fixed_engine(now)).expect("Failed to create repo");

    let saved = repo
        .insert(DeficiencyItem::new("DEF_LT", Some("life_threatening")))
        .unwrap();

    let reloaded = repo.find_by_id("DEF_LT").unwrap().unwrap();
    assert_eq!(
        reloaded.correction_deadline,
        Some(now + Duration::seconds(LIFE_THREATENING_WINDOW_SECS))
    );
    assert_eq!(saved.correction_deadline, reloaded.correction_deadline);
}

#[test]
fn test_absent_and_unrecognized_leave_deadline_unset() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let engine = fixed_engine(base_instant());
    let repo = repo_with_hook(&db_path, engine.clone()).expect("Failed to create repo");

    for (id, severity) in [("DEF_NONE", None), ("DEF_EMPTY", Some("")), ("DEF_LOW", Some("low"))] {
        assert!(engine.calculate(severity).is_none());
        assert!(calculate_deadline(severity, base_instant()).is_none());

        let saved = repo.insert(DeficiencyItem::new(id, severity)).unwrap();
        assert!(saved.correction_deadline.is_none(), "{} 不应产生期限", id);
    }
}

#[test]
fn test_free_function_matches_engine() {
    let engine = fixed_engine(base_instant());
    for severity in ["life_threatening", "severe", "moderate"] {
        assert_eq!(
            engine.calculate(Some(severity)),
            calculate_deadline(Some(severity), engine.now())
        );
    }
}
