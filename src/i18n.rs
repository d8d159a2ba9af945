// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::types::{DeadlineStatus, Severity};

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use nspire_compliance::i18n::t_with_args;
/// let msg = t_with_args("common.not_found", &[("id", "DEF_001")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 严重等级文案（原始代码）
///
/// 缺失/空 → severity.missing, 未识别 → severity.unrecognized
pub fn severity_label(code: Option<&str>) -> String {
    match code {
        None | Some("") => t("severity.missing"),
        Some(c) => match Severity::parse(c) {
            Some(level) => t(level.label_key()),
            None => t("severity.unrecognized"),
        },
    }
}

/// 期限状态文案
pub fn status_label(status: DeadlineStatus) -> String {
    t(status.label_key())
}
