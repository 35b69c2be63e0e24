use serde::{Deserialize, Deserializer, Serialize};

use crate::dashboard::view_state::DataLimit;

/// 未填写标签时的默认值
pub const DEFAULT_LABEL: &str = "Snapshot";

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

// 无法识别的 limit（如其他版本导出的文件）按缺失处理
fn lenient_limit<'de, D>(deserializer: D) -> Result<Option<DataLimit>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value::<DataLimit>(v).ok()))
}

/// 用户保存的市场统计快照
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// 创建时的毫秒时间戳，用作删除/编辑的键
    pub id: i64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_limit", skip_serializing_if = "Option::is_none")]
    pub limit: Option<DataLimit>,
    #[serde(default)]
    pub avg: String,
    #[serde(default)]
    pub median: String,
    /// "P (p%) / N (n%)"
    #[serde(default)]
    pub sentiment: String,
}

impl Snapshot {
    /// 导入去重使用的内容键
    pub fn same_content(&self, other: &Snapshot) -> bool {
        self.timestamp == other.timestamp && self.label == other.label && self.avg == other.avg
    }

    /// View 列的展示文本
    pub fn view_text(&self) -> String {
        match self.limit {
            Some(limit) => limit.view_label(),
            None => "-".to_string(),
        }
    }

    /// View 列排序使用的字符串
    pub fn limit_key(&self) -> String {
        self.limit.map(|l| l.as_key()).unwrap_or_default()
    }
}

/// 保存快照时从看板读取的当前值
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotCapture {
    pub avg: String,
    pub median: String,
    pub sentiment: String,
    pub limit: DataLimit,
}

/// 标签为空时回退到默认值
pub fn normalize_label(label: Option<&str>) -> String {
    match label {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => default_label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_exported_snapshot() {
        let json = r#"[
            {"id": 1714550400000, "timestamp": "5/1/2024, 8:00:00 AM", "label": "Morning",
             "limit": 25, "avg": "+10.95%", "median": "+8.00%", "sentiment": "300 (60%) / 200 (40%)"},
            {"id": 1714550500000, "timestamp": "5/1/2024, 8:01:40 AM", "limit": "all",
             "avg": "-1.00%", "median": "0.00%", "sentiment": "0 / 0"},
            {"id": 1714550600000, "limit": 7}
        ]"#;
        let list: Vec<Snapshot> = serde_json::from_str(json).unwrap();
        assert_eq!(list[0].limit, Some(DataLimit::Top25));
        assert_eq!(list[0].view_text(), "Top 25");
        assert_eq!(list[1].label, DEFAULT_LABEL);
        assert_eq!(list[1].view_text(), "All");
        assert_eq!(list[2].limit, None);
        assert_eq!(list[2].view_text(), "-");
    }

    #[test]
    fn test_serialize_limit_shape() {
        let snapshot = Snapshot {
            id: 1,
            timestamp: "2024-05-01 08:00:00".to_string(),
            label: "x".to_string(),
            limit: Some(DataLimit::Top10),
            avg: "+1.00%".to_string(),
            median: "+1.00%".to_string(),
            sentiment: "1 (100%) / 0 (0%)".to_string(),
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["limit"], serde_json::json!(10));
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label(None), "Snapshot");
        assert_eq!(normalize_label(Some("")), "Snapshot");
        assert_eq!(normalize_label(Some("Funding spike")), "Funding spike");
    }
}
