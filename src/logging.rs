// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 环境变量:
// - RUST_LOG: 日志级别过滤器（默认: info）
// - NSPIRE_LOG_FORMAT: text（默认）或 json
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 从 NSPIRE_LOG_FORMAT 读取, 未设置或无法识别时为 Text
    pub fn from_env() -> Self {
        match std::env::var("NSPIRE_LOG_FORMAT") {
            Ok(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志系统
///
/// # 示例
/// ```no_run
/// use nspire_compliance::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_format(LogFormat::from_env());
}

/// 按指定格式初始化日志系统
///
/// 日志写到 stderr, 不干扰 CLI 的 stdout 输出
pub fn init_with_format(format: LogFormat) {
    match format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter())
            .with_target(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter())
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试; 重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
