use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// 快照时间戳的展示格式
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// 导入文件可能来自其他客户端，按顺序尝试这些格式
const ACCEPTED_FORMATS: &[&str] = &[
    DISPLAY_FORMAT,
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn mill_time_to_local_display(timestamp_ms: i64) -> Result<String, String> {
    // 将毫秒级时间戳转换为本地时间
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(datetime) => Ok(datetime.format(DISPLAY_FORMAT).to_string()),
        chrono::LocalResult::None => Err("Invalid timestamp: None".to_string()),
        chrono::LocalResult::Ambiguous(earliest, _) => {
            Ok(earliest.format(DISPLAY_FORMAT).to_string())
        }
    }
}

/// 当前 UTC 日期，如 2024-05-01（导出文件名用）
pub fn iso_date_today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// 解析快照的展示时间为毫秒时间戳，无法解析返回 None
///
/// 无时区的格式按本地时间解释，与 [`mill_time_to_local_display`] 写入时一致。
pub fn parse_display_time(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp_millis())
}
