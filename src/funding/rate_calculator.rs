//! 资金费率年化与统计
//!
//! 年化公式：`rate × (24 / hours) × 365 × 100`，不做任何截断，
//! 结算周期极短时结果可能非常大。

use crate::bybit::market::TickersData;

/// 结算周期缺失或无法解析时的默认小时数
pub const DEFAULT_INTERVAL_HOURS: f64 = 8.0;

/// 解析字符串开头的数字部分，行为与宽松的浮点解析一致：
/// `"+10.95%"` → 10.95，`"12 (40%)"` → 12，无数字前缀返回 NaN。
pub fn parse_float_prefix(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    // 只有符号或小数点
    if !s[digits_start..end].bytes().any(|b| b.is_ascii_digit()) {
        return f64::NAN;
    }
    // 指数部分必须完整才计入
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// 结算周期小时数，无法解析或为 0 时取默认 8 小时
pub fn interval_hours(interval: &str) -> f64 {
    let hours = parse_float_prefix(interval);
    if hours.is_nan() || hours == 0.0 {
        DEFAULT_INTERVAL_HOURS
    } else {
        hours
    }
}

/// 已解析数值的年化（百分比）；费率为 0 或 NaN 时返回 0
pub fn annualize(rate: f64, hours: f64) -> f64 {
    if rate == 0.0 || rate.is_nan() {
        return 0.0;
    }
    rate * (24.0 / hours) * 365.0 * 100.0
}

/// 原始字符串的年化（百分比）
///
/// 空费率返回 0；非空但无法解析的费率返回 NaN，由统计环节过滤。
pub fn annualized_rate(funding_rate: &str, interval: &str) -> f64 {
    let raw = funding_rate.trim();
    if raw.is_empty() {
        return 0.0;
    }
    let rate = parse_float_prefix(raw);
    if rate.is_nan() {
        return f64::NAN;
    }
    annualize(rate, interval_hours(interval))
}

/// 正数带 `+`，保留两位小数，后缀 `%`
pub fn format_percentage(value: f64) -> String {
    // 避免出现 "-0.00%"
    let value = if value == 0.0 { 0.0 } else { value };
    let sign = if value > 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, value)
}

/// 中位数；空序列返回 0
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let half = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[half]
    } else {
        (sorted[half - 1] + sorted[half]) / 2.0
    }
}

/// 工作列表的年化均值与中位数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundingStats {
    pub avg: f64,
    pub median: f64,
}

impl FundingStats {
    pub fn avg_text(&self) -> String {
        format_percentage(self.avg)
    }

    pub fn median_text(&self) -> String {
        format_percentage(self.median)
    }
}

/// 统计值的样式类
pub fn stat_class(value: f64) -> &'static str {
    if value >= 0.0 {
        "positive-text"
    } else {
        "negative-text"
    }
}

/// 计算年化费率的均值与中位数，NaN 不参与；没有有效值时返回 None
pub fn compute_funding_stats(tickers: &[TickersData]) -> Option<FundingStats> {
    let rates: Vec<f64> = tickers
        .iter()
        .map(|t| annualized_rate(&t.funding_rate, &t.funding_interval_hour))
        .filter(|apr| !apr.is_nan())
        .collect();

    if rates.is_empty() {
        return None;
    }

    let avg = rates.iter().sum::<f64>() / rates.len() as f64;
    Some(FundingStats {
        avg,
        median: median(&rates),
    })
}
