//! 历史快照表的排序

use std::cmp::Ordering;

use crate::dashboard::view_state::{cmp_f64, SortDirection};
use crate::funding::rate_calculator::parse_float_prefix;
use crate::snapshot::model::Snapshot;
use crate::time_util::parse_display_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryColumn {
    Time,
    Label,
    View,
    Avg,
    Median,
    Sentiment,
}

impl HistoryColumn {
    pub const ALL: [HistoryColumn; 6] = [
        HistoryColumn::Time,
        HistoryColumn::Label,
        HistoryColumn::View,
        HistoryColumn::Avg,
        HistoryColumn::Median,
        HistoryColumn::Sentiment,
    ];

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "time" | "date" => Some(HistoryColumn::Time),
            "label" => Some(HistoryColumn::Label),
            "view" | "limit" => Some(HistoryColumn::View),
            "avg" => Some(HistoryColumn::Avg),
            "median" => Some(HistoryColumn::Median),
            "sentiment" => Some(HistoryColumn::Sentiment),
            _ => None,
        }
    }

    /// 升序比较
    pub fn compare(&self, a: &Snapshot, b: &Snapshot) -> Ordering {
        match self {
            HistoryColumn::Time => time_key(a).cmp(&time_key(b)),
            HistoryColumn::Label => a.label.to_lowercase().cmp(&b.label.to_lowercase()),
            HistoryColumn::View => a.limit_key().cmp(&b.limit_key()),
            HistoryColumn::Avg => cmp_f64(parse_float_prefix(&a.avg), parse_float_prefix(&b.avg)),
            HistoryColumn::Median => cmp_f64(
                parse_float_prefix(&a.median),
                parse_float_prefix(&b.median),
            ),
            HistoryColumn::Sentiment => {
                match (positive_count(&a.sentiment), positive_count(&b.sentiment)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    _ => Ordering::Equal,
                }
            }
        }
    }
}

/// 时间无法解析（或为 0）时退回到 id
fn time_key(snapshot: &Snapshot) -> i64 {
    match parse_display_time(&snapshot.timestamp) {
        Some(ms) if ms != 0 => ms,
        _ => snapshot.id,
    }
}

/// "/" 前的正费率数量
fn positive_count(sentiment: &str) -> Option<i64> {
    let head = sentiment.split('/').next().unwrap_or_default().trim_start();
    let bytes = head.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits {
        return None;
    }
    head[..end].parse::<i64>().ok()
}

/// 历史表排序状态，与行情表互相独立
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryViewState {
    pub sort_column: HistoryColumn,
    pub sort_direction: SortDirection,
}

impl Default for HistoryViewState {
    fn default() -> Self {
        Self {
            sort_column: HistoryColumn::Time,
            sort_direction: SortDirection::Desc,
        }
    }
}

impl HistoryViewState {
    /// 同列切换方向，新列从降序开始
    pub fn toggle_sort(&mut self, column: HistoryColumn) {
        if self.sort_column == column {
            self.sort_direction = self.sort_direction.flip();
        } else {
            self.sort_column = column;
            self.sort_direction = SortDirection::Desc;
        }
    }
}

/// 稳定排序
pub fn sort_snapshots(snapshots: &mut [Snapshot], column: HistoryColumn, direction: SortDirection) {
    snapshots.sort_by(|a, b| direction.apply(column.compare(a, b)));
}
