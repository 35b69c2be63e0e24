//! 资金费率：拉取、年化、情绪统计与表格行

pub mod fetcher;
pub mod rate_calculator;
pub mod sentiment;
pub mod table_renderer;

// 重新导出常用类型
pub use fetcher::{normalize_tickers, MarketDataSource, StaticSource, TickerCache};
pub use rate_calculator::{annualized_rate, format_percentage, median, FundingStats};
pub use sentiment::{aggregate, SentimentStats};
pub use table_renderer::{build_rows, ColorClass, TickerRow};
