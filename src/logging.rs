// ==========================================
// 租屋管理系统 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 日志级别: RUST_LOG（默认 info）
// 输出格式: RENTAL_BILLING_LOG_FORMAT=json 时输出 JSON，否则为文本
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "RENTAL_BILLING_LOG_FORMAT";

/// 是否输出 JSON 日志
fn json_requested(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=rental_billing::engine=debug
/// - RENTAL_BILLING_LOG_FORMAT: `json` 输出结构化日志
///
/// # 示例
/// ```no_run
/// use rental_billing::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = std::env::var(LOG_FORMAT_ENV).ok();

    // 日志写到 stderr，stdout 留给命令输出
    if json_requested(format.as_deref()) {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_current_span(false)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .init();
    }
}

/// 初始化测试环境的日志系统（debug 级别，可重复调用）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_requested() {
        assert!(json_requested(Some("json")));
        assert!(json_requested(Some(" JSON ")));
        assert!(!json_requested(Some("text")));
        assert!(!json_requested(None));
    }

    #[test]
    fn test_init_test_is_repeatable() {
        init_test();
        init_test();
        tracing::debug!("测试日志");
    }
}
