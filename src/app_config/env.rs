use std::env;

/// 读取布尔型环境变量：支持 true/false/1/0（大小写不敏感）
pub fn env_is_true(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => {
            let v = v.trim();
            v.eq_ignore_ascii_case("true") || v == "1"
        }
        Err(_) => default,
    }
}

/// 读取字符串环境变量，若不存在则返回默认值
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// 读取 u64 环境变量，不存在或解析失败返回默认值
pub fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_helpers_fallback() {
        let key = "FUNDING_DASHBOARD_TEST_UNSET_KEY";
        env::remove_var(key);
        assert!(env_is_true(key, true));
        assert_eq!(env_or_default(key, "x"), "x");
        assert_eq!(env_u64(key, 30), 30);
    }

    #[test]
    fn test_env_u64_invalid_value() {
        let key = "FUNDING_DASHBOARD_TEST_BAD_U64";
        env::set_var(key, "abc");
        assert_eq!(env_u64(key, 7), 7);
        env::set_var(key, " 12 ");
        assert_eq!(env_u64(key, 7), 12);
        env::remove_var(key);
    }
}
