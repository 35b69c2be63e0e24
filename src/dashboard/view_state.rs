//! 看板视图状态：limit、排序、搜索与当前工作列表

use std::cmp::Ordering;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::bybit::market::TickersData;
use crate::funding::rate_calculator::{annualized_rate, parse_float_prefix, FundingStats};
use crate::funding::sentiment::SentimentStats;

/// 展示范围：Top N、全部或历史快照视图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLimit {
    Top5,
    Top10,
    Top25,
    Top50,
    All,
    History,
}

impl Default for DataLimit {
    fn default() -> Self {
        DataLimit::Top25
    }
}

impl DataLimit {
    /// 标签页顺序
    pub const TABS: [DataLimit; 6] = [
        DataLimit::All,
        DataLimit::Top50,
        DataLimit::Top25,
        DataLimit::Top10,
        DataLimit::Top5,
        DataLimit::History,
    ];

    /// Top N 的 N；All/History 返回 None
    pub fn count(&self) -> Option<usize> {
        match self {
            DataLimit::Top5 => Some(5),
            DataLimit::Top10 => Some(10),
            DataLimit::Top25 => Some(25),
            DataLimit::Top50 => Some(50),
            DataLimit::All | DataLimit::History => None,
        }
    }

    pub fn from_count(count: u64) -> Option<Self> {
        match count {
            5 => Some(DataLimit::Top5),
            10 => Some(DataLimit::Top10),
            25 => Some(DataLimit::Top25),
            50 => Some(DataLimit::Top50),
            _ => None,
        }
    }

    /// 存储用的字符串：`5|10|25|50|all|history`
    pub fn as_key(&self) -> String {
        match self {
            DataLimit::All => "all".to_string(),
            DataLimit::History => "history".to_string(),
            other => other.count().unwrap_or_default().to_string(),
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("all") {
            return Some(DataLimit::All);
        }
        if text.eq_ignore_ascii_case("history") {
            return Some(DataLimit::History);
        }
        text.parse::<u64>().ok().and_then(DataLimit::from_count)
    }

    /// 页面标题
    pub fn title(&self) -> String {
        match self {
            DataLimit::History => "Market History".to_string(),
            DataLimit::All => "All Market Funding Rates".to_string(),
            other => format!("Top {} Funding Rates", other.count().unwrap_or_default()),
        }
    }

    /// 快照表 View 列
    pub fn view_label(&self) -> String {
        match self {
            DataLimit::All => "All".to_string(),
            DataLimit::History => "History".to_string(),
            other => format!("Top {}", other.count().unwrap_or_default()),
        }
    }
}

impl fmt::Display for DataLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

// Top N 存为数字，all/history 存为字符串，与已有的快照文件保持一致
impl Serialize for DataLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.count() {
            Some(n) => serializer.serialize_u64(n as u64),
            None => serializer.serialize_str(&self.as_key()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Num(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for DataLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match RawLimit::deserialize(deserializer)? {
            RawLimit::Num(n) => DataLimit::from_count(n),
            RawLimit::Text(s) => DataLimit::parse(&s),
        };
        parsed.ok_or_else(|| de::Error::custom("unknown data limit"))
    }
}

/// 行情表排序列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Symbol,
    FundingRate,
    Annualized,
    Turnover24h,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [
        SortColumn::Symbol,
        SortColumn::FundingRate,
        SortColumn::Annualized,
        SortColumn::Turnover24h,
    ];

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "symbol" => Some(SortColumn::Symbol),
            "rate" | "fundingrate" | "funding" => Some(SortColumn::FundingRate),
            "apr" | "annualized" => Some(SortColumn::Annualized),
            "volume" | "turnover" | "turnover24h" => Some(SortColumn::Turnover24h),
            _ => None,
        }
    }

    /// 升序比较
    pub fn compare(&self, a: &TickersData, b: &TickersData) -> Ordering {
        match self {
            SortColumn::Symbol => a.symbol.cmp(&b.symbol),
            SortColumn::FundingRate => cmp_f64(a.rate(), b.rate()),
            SortColumn::Annualized => cmp_f64(
                annualized_rate(&a.funding_rate, &a.funding_interval_hour),
                annualized_rate(&b.funding_rate, &b.funding_interval_hour),
            ),
            SortColumn::Turnover24h => cmp_f64(
                parse_float_prefix(&a.turnover24h),
                parse_float_prefix(&b.turnover24h),
            ),
        }
    }
}

/// NaN 视为相等
pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// 排序图标
    pub fn glyph(self) -> &'static str {
        match self {
            SortDirection::Asc => " ▲",
            SortDirection::Desc => " ▼",
        }
    }
}

/// 单个会话持有的视图状态
#[derive(Debug, Clone)]
pub struct ViewState {
    pub data_limit: DataLimit,
    pub sort_column: SortColumn,
    pub sort_direction: SortDirection,
    pub search_query: String,
    pub is_searching: bool,
    /// 当前展示的合约
    pub working_list: Vec<TickersData>,
    /// 最近一次计算的年化统计
    pub stats: Option<FundingStats>,
    /// 最近一次计算的全市场情绪
    pub sentiment: Option<SentimentStats>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            data_limit: DataLimit::default(),
            sort_column: SortColumn::Turnover24h,
            sort_direction: SortDirection::Desc,
            search_query: String::new(),
            is_searching: false,
            working_list: Vec::new(),
            stats: None,
            sentiment: None,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 limit 截取（缓存已按成交额降序）
    pub fn limit_slice(&self, cache: &[TickersData]) -> Vec<TickersData> {
        match self.data_limit.count() {
            Some(n) => cache.iter().take(n).cloned().collect(),
            None => cache.to_vec(),
        }
    }

    /// 在全部缓存中按子串匹配合约
    pub fn search_matches(query: &str, cache: &[TickersData]) -> Vec<TickersData> {
        cache
            .iter()
            .filter(|t| t.symbol.contains(query))
            .cloned()
            .collect()
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.is_searching = false;
    }

    /// 同列切换方向，新列从降序开始
    pub fn toggle_sort(&mut self, column: SortColumn) {
        if self.sort_column == column {
            self.sort_direction = self.sort_direction.flip();
        } else {
            self.sort_column = column;
            self.sort_direction = SortDirection::Desc;
        }
    }

    /// 稳定排序工作列表
    pub fn sort_working_list(&mut self) {
        let column = self.sort_column;
        let direction = self.sort_direction;
        self.working_list
            .sort_by(|a, b| direction.apply(column.compare(a, b)));
    }

    pub fn title(&self) -> String {
        if self.is_searching {
            format!("Search Results: \"{}\"", self.search_query)
        } else {
            self.data_limit.title()
        }
    }
}
