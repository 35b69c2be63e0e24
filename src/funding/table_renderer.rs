use crate::bybit::market::TickersData;
use crate::funding::rate_calculator::{annualize, format_percentage, interval_hours, parse_float_prefix};

/// 表格为空时的提示
pub const EMPTY_MESSAGE: &str = "No matching markets.";
/// 拉取失败时的提示
pub const ERROR_MESSAGE: &str = "Error loading data.";
/// 首次加载提示
pub const LOADING_MESSAGE: &str = "Loading market data...";

/// 行颜色，取决于年化费率的符号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    Positive,
    Negative,
    Neutral,
}

impl ColorClass {
    pub fn from_value(value: f64) -> Self {
        if value > 0.0 {
            ColorClass::Positive
        } else if value < 0.0 {
            ColorClass::Negative
        } else {
            ColorClass::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorClass::Positive => "positive",
            ColorClass::Negative => "negative",
            ColorClass::Neutral => "neutral",
        }
    }
}

/// 表格中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct TickerRow {
    /// 排序后的位置，从 1 开始
    pub rank: usize,
    /// 去掉 USDT/USDC 后缀的币种
    pub symbol: String,
    pub funding_rate: f64,
    pub interval_hours: f64,
    pub annualized_pct: f64,
    pub volume: f64,
    pub color: ColorClass,
}

impl TickerRow {
    pub fn from_ticker(rank: usize, ticker: &TickersData) -> Self {
        let funding_rate = parse_float_prefix(&ticker.funding_rate);
        let hours = interval_hours(&ticker.funding_interval_hour);
        let annualized_pct = annualize(funding_rate, hours);
        Self {
            rank,
            symbol: display_symbol(&ticker.symbol).to_string(),
            funding_rate,
            interval_hours: hours,
            annualized_pct,
            volume: ticker.turnover(),
            color: ColorClass::from_value(annualized_pct),
        }
    }

    pub fn rank_text(&self) -> String {
        format!("#{}", self.rank)
    }

    /// 原始费率 ×100，四位小数
    pub fn rate_text(&self) -> String {
        format!("{:.4}%", self.funding_rate * 100.0)
    }

    pub fn interval_text(&self) -> String {
        format!("{}h", self.interval_hours)
    }

    pub fn apr_text(&self) -> String {
        format_percentage(self.annualized_pct)
    }

    /// 以百万为单位的成交额
    pub fn volume_text(&self) -> String {
        format!("${:.2}M", self.volume / 1_000_000.0)
    }
}

pub fn display_symbol(symbol: &str) -> &str {
    symbol
        .strip_suffix("USDT")
        .or_else(|| symbol.strip_suffix("USDC"))
        .unwrap_or(symbol)
}

/// 按当前顺序生成展示行
pub fn build_rows(tickers: &[TickersData]) -> Vec<TickerRow> {
    tickers
        .iter()
        .enumerate()
        .map(|(index, ticker)| TickerRow::from_ticker(index + 1, ticker))
        .collect()
}
