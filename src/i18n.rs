// ==========================================
// 租屋管理系统 - 国际化 (i18n)
// ==========================================
// 使用 rust-i18n 库，文案位于 locales/*.yml
// 支持繁体中文（默认 zh-TW）和英文（en）
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-TW";

/// 语言环境变量
pub const LOCALE_ENV: &str = "RENTAL_BILLING_LOCALE";

/// 按环境变量设置语言（未设置时用默认语言）
pub fn init_from_env() {
    let locale = std::env::var(LOCALE_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    set_locale(&locale);
}

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-TW" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use rental_billing::i18n::t;
/// let msg = t("allocation.no_valid_master_bill");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数，占位符格式 `%{name}`）
///
/// # 示例
/// ```no_run
/// use rental_billing::i18n::t_with_args;
/// let msg = t_with_args("allocation.negative_public_energy", &[("public_kwh", "-50")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
